//! The Submission Controller.
//!
//! Owns the [`Session`] and mediates between user actions and the two
//! outbound submissions:
//!
//! ```text
//! select_file / clear_file / select_mode / adjust_dpi   (&mut self, synchronous)
//!        │
//!        └─ view update ─────────────────────────────▶ Presenter
//!
//! submit_conversion / submit_extraction                 (&self, async)
//!        │
//!        ├─ 1. no file?         return NoFileSelected
//!        ├─ 2. in flight?       return AlreadyInFlight
//!        ├─ 3. busy on          ─────────────────────▶ Presenter
//!        ├─ 4. POST multipart   ─────────────────────▶ Transport
//!        ├─ 5. 2xx → download   ─────────────────────▶ Presenter
//!        │     else → notice    ─────────────────────▶ Presenter
//!        └─ 6. busy off (drop guard, every exit path)
//! ```
//!
//! Mutating the session needs `&mut self` and submitting only `&self`, so a
//! selection can never change underneath a request in flight.

use crate::config::{ClientConfig, ConversionMode};
use crate::error::ClientError;
use crate::presenter::Presenter;
use crate::protocol::{self, Download, UploadForm};
use crate::session::{SelectedFile, Session, ViewState};
use crate::transport::Transport;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// How a submission ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The server answered 2xx and the result was handed to the presenter.
    Delivered(Download),
    /// Nothing is selected; nothing was sent.
    NoFileSelected,
    /// Another submission on this controller is still running; nothing was sent.
    AlreadyInFlight,
}

/// Drives one session against a conversion service.
pub struct SubmissionController<T, P> {
    config: ClientConfig,
    session: Session,
    transport: T,
    presenter: P,
    in_flight: AtomicBool,
}

impl<T: Transport, P: Presenter> SubmissionController<T, P> {
    /// Start an empty session and report the initial view.
    pub fn new(config: ClientConfig, transport: T, presenter: P) -> Self {
        let session = Session::new(&config);
        let controller = Self {
            config,
            session,
            transport,
            presenter,
            in_flight: AtomicBool::new(false),
        };
        controller.emit_view();
        controller
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn view(&self) -> ViewState {
        self.session.view(self.is_busy())
    }

    fn emit_view(&self) {
        self.presenter.on_view_changed(&self.view());
    }

    // ── User actions ─────────────────────────────────────────────────────

    /// Select `file`. A non-PDF is rejected with a notice and nothing changes.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), ClientError> {
        match self.session.select(file) {
            Ok(()) => {
                self.emit_view();
                Ok(())
            }
            Err(e) => {
                self.presenter.notify(&e.to_string());
                Err(e)
            }
        }
    }

    /// Remove the selection. Mode and DPI are kept.
    pub fn clear_file(&mut self) {
        self.session.clear();
        self.emit_view();
    }

    pub fn select_mode(&mut self, mode: ConversionMode) {
        self.session.set_mode(mode);
        self.emit_view();
    }

    /// Move the DPI control. Returns the value actually held after clamping.
    pub fn adjust_dpi(&mut self, dpi: u32) -> u32 {
        let held = self.session.set_dpi(dpi);
        self.emit_view();
        held
    }

    // ── Submissions ──────────────────────────────────────────────────────

    /// POST the selection with the active mode and DPI to `/convert`.
    ///
    /// On success the result is delivered as `converted_presentation.pptx`.
    /// On failure a notice is shown and the error is also returned.
    pub async fn submit_conversion(&self) -> Result<Submission, ClientError> {
        let Some(file) = self.session.file() else {
            debug!("Convert requested with no file selected");
            return Ok(Submission::NoFileSelected);
        };
        let form = UploadForm::conversion(file.clone(), self.session.mode(), self.session.dpi());
        self.submit(form).await
    }

    /// POST the selection alone to `/extract_text`.
    ///
    /// On success the result is delivered as `extracted_text.txt`.
    pub async fn submit_extraction(&self) -> Result<Submission, ClientError> {
        let Some(file) = self.session.file() else {
            debug!("Extract requested with no file selected");
            return Ok(Submission::NoFileSelected);
        };
        self.submit(UploadForm::extraction(file.clone())).await
    }

    async fn submit(&self, form: UploadForm) -> Result<Submission, ClientError> {
        let operation = form.operation;
        let Some(_busy) = BusyGuard::acquire(self) else {
            warn!("Ignoring {} request: a submission is already in flight", operation.noun());
            return Ok(Submission::AlreadyInFlight);
        };

        info!("Submitting '{}' for {}", form.file.name(), operation.noun());
        match self.exchange(form).await {
            Ok(download) => {
                info!(
                    "{} complete: {} ({} bytes)",
                    operation.noun(),
                    download.filename,
                    download.contents.len()
                );
                Ok(Submission::Delivered(download))
            }
            Err(e) => {
                error!("{} failed: {}", operation.noun(), e);
                self.presenter.notify(&operation.failure_notice(&e.to_string()));
                Err(e)
            }
        }
        // `_busy` drops here, after the notice, on every path.
    }

    async fn exchange(&self, form: UploadForm) -> Result<Download, ClientError> {
        let operation = form.operation;
        let response = self.transport.submit(form).await?;

        if !response.is_success() {
            return Err(ClientError::Rejected {
                status: response.status,
                message: protocol::failure_reason(operation, &response),
            });
        }

        let download = Download {
            filename: operation.download_filename().to_string(),
            content_type: response.content_type,
            contents: response.body,
        };
        self.presenter.deliver(&download)?;
        Ok(download)
    }
}

/// Holds the in-flight flag and the busy indicator for one submission.
///
/// Releasing happens in `Drop`, so the indicator is hidden on success, on
/// error, and while unwinding from a panic in the transport or presenter.
struct BusyGuard<'a, T: Transport, P: Presenter> {
    controller: &'a SubmissionController<T, P>,
}

impl<'a, T: Transport, P: Presenter> BusyGuard<'a, T, P> {
    fn acquire(controller: &'a SubmissionController<T, P>) -> Option<Self> {
        controller
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        controller.presenter.set_busy(true);
        controller.emit_view();
        Some(Self { controller })
    }
}

impl<T: Transport, P: Presenter> Drop for BusyGuard<'_, T, P> {
    fn drop(&mut self) {
        self.controller.in_flight.store(false, Ordering::Release);
        self.controller.presenter.set_busy(false);
        self.controller.emit_view();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::{PresenterEvent, Recorder};
    use crate::protocol::{Operation, RawResponse};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// Replays scripted responses and records every form it was given.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<RawResponse, ClientError>>>,
        forms: Mutex<Vec<UploadForm>>,
    }

    impl ScriptedTransport {
        fn replying(reply: Result<RawResponse, ClientError>) -> Self {
            let t = Self::default();
            t.replies.lock().unwrap().push_back(reply);
            t
        }

        fn forms(&self) -> Vec<UploadForm> {
            self.forms.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn submit(&self, form: UploadForm) -> Result<RawResponse, ClientError> {
            self.forms.lock().unwrap().push(form);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Internal("no scripted reply".into())))
        }
    }

    fn reply(status: u16, status_text: &str, body: &'static [u8]) -> Result<RawResponse, ClientError> {
        Ok(RawResponse {
            status,
            status_text: Some(status_text.to_string()),
            content_type: None,
            body: Bytes::from_static(body),
        })
    }

    fn pdf(name: &str) -> SelectedFile {
        SelectedFile::new(name, "application/pdf", &b"%PDF-1.7"[..])
    }

    fn controller<T: Transport>(transport: T) -> SubmissionController<T, Arc<Recorder>> {
        SubmissionController::new(ClientConfig::default(), transport, Arc::new(Recorder::new()))
    }

    #[test]
    fn new_reports_initial_view() {
        let c = controller(ScriptedTransport::default());
        let view = c.presenter().last_view().unwrap();
        assert!(view.drop_zone_visible);
        assert!(!view.actions_enabled);
        assert!(!view.busy);
    }

    #[test]
    fn rejected_selection_notifies_and_keeps_state() {
        let mut c = controller(ScriptedTransport::default());
        let before = c.view();
        let events_before = c.presenter().events().len();

        let err = c
            .select_file(SelectedFile::new("a.docx", "application/msword", &b"x"[..]))
            .unwrap_err();
        assert!(matches!(err, ClientError::NotAPdf { .. }));
        assert_eq!(c.view(), before);

        let events = c.presenter().events();
        assert_eq!(
            events[events_before..].to_vec(),
            vec![PresenterEvent::Notice("Please upload a PDF file.".into())]
        );
    }

    #[test]
    fn selection_mode_and_dpi_update_view() {
        let mut c = controller(ScriptedTransport::default());
        c.select_file(pdf("doc.pdf")).unwrap();
        assert_eq!(c.presenter().last_view().unwrap().file_name.as_deref(), Some("doc.pdf"));

        c.select_mode(ConversionMode::Separated);
        assert!(!c.presenter().last_view().unwrap().dpi_visible);

        assert_eq!(c.adjust_dpi(250), 250);
        let v = c.presenter().last_view().unwrap();
        assert_eq!(v.dpi_readout, "250");
        assert!(!v.dpi_visible);

        c.clear_file();
        let v = c.presenter().last_view().unwrap();
        assert!(!v.actions_enabled);
        assert_eq!(v.mode, ConversionMode::Separated);
        assert_eq!(v.dpi_readout, "250");
    }

    #[tokio::test]
    async fn submit_without_file_is_a_noop() {
        let c = controller(ScriptedTransport::default());
        let events_before = c.presenter().events().len();
        assert_eq!(c.submit_conversion().await.unwrap(), Submission::NoFileSelected);
        assert_eq!(c.submit_extraction().await.unwrap(), Submission::NoFileSelected);
        assert!(c.transport().forms().is_empty());
        assert_eq!(c.presenter().events().len(), events_before);
    }

    #[tokio::test]
    async fn conversion_success_delivers_pptx() {
        let mut c = controller(ScriptedTransport::replying(reply(200, "OK", b"PK\x03\x04slides")));
        c.select_file(pdf("doc.pdf")).unwrap();
        c.select_mode(ConversionMode::Image);
        c.adjust_dpi(150);

        let outcome = c.submit_conversion().await.unwrap();
        let Submission::Delivered(download) = outcome else {
            panic!("expected delivery, got {outcome:?}");
        };
        assert_eq!(download.filename, "converted_presentation.pptx");
        assert_eq!(download.contents.as_ref(), b"PK\x03\x04slides");

        let forms = c.transport().forms();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].operation, Operation::Convert);
        assert_eq!(forms[0].field("mode"), Some("image"));
        assert_eq!(forms[0].field("dpi"), Some("150"));
        assert_eq!(forms[0].file.name(), "doc.pdf");

        assert_eq!(c.presenter().downloads(), vec![download]);
        assert!(c.presenter().notices().is_empty());
        assert!(!c.presenter().is_busy());
        assert!(!c.presenter().last_view().unwrap().busy);
    }

    #[tokio::test]
    async fn busy_is_shown_then_hidden_around_the_request() {
        let mut c = controller(ScriptedTransport::replying(reply(200, "OK", b"text")));
        c.select_file(pdf("doc.pdf")).unwrap();
        c.submit_extraction().await.unwrap();

        let busy: Vec<bool> = c
            .presenter()
            .events()
            .into_iter()
            .filter_map(|e| match e {
                PresenterEvent::Busy(b) => Some(b),
                _ => None,
            })
            .collect();
        assert_eq!(busy, vec![true, false]);
    }

    #[tokio::test]
    async fn server_detail_becomes_the_notice() {
        let mut c = controller(ScriptedTransport::replying(reply(
            500,
            "Internal Server Error",
            br#"{"detail":"corrupt file"}"#,
        )));
        c.select_file(pdf("doc.pdf")).unwrap();

        let err = c.submit_conversion().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(
            c.presenter().notices(),
            vec!["An error occurred during conversion: corrupt file".to_string()]
        );
        assert!(c.presenter().downloads().is_empty());
        assert!(!c.presenter().is_busy());
        assert!(!c.is_busy());
    }

    #[tokio::test]
    async fn non_json_failure_uses_status_text() {
        let mut c = controller(ScriptedTransport::replying(reply(
            500,
            "Internal Server Error",
            b"Traceback (most recent call last)",
        )));
        c.select_file(pdf("doc.pdf")).unwrap();
        c.submit_extraction().await.unwrap_err();
        assert_eq!(
            c.presenter().notices(),
            vec!["An error occurred during extraction: Internal Server Error".to_string()]
        );
    }

    #[tokio::test]
    async fn transport_error_is_reported_and_busy_cleared() {
        let mut c = controller(ScriptedTransport::replying(Err(ClientError::Transport(
            "connection reset".into(),
        ))));
        c.select_file(pdf("doc.pdf")).unwrap();
        let err = c.submit_conversion().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(
            c.presenter().notices(),
            vec!["An error occurred during conversion: connection reset".to_string()]
        );
        assert!(!c.presenter().is_busy());
    }

    /// Accepts everything except downloads.
    struct FullDisk(Recorder);

    impl Presenter for FullDisk {
        fn notify(&self, message: &str) {
            self.0.notify(message)
        }

        fn set_busy(&self, busy: bool) {
            self.0.set_busy(busy)
        }

        fn deliver(&self, download: &Download) -> Result<(), ClientError> {
            Err(ClientError::OutputWriteFailed {
                path: download.filename.clone().into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "no space left on device"),
            })
        }
    }

    #[tokio::test]
    async fn delivery_failure_is_reported_and_busy_cleared() {
        let mut c = SubmissionController::new(
            ClientConfig::default(),
            ScriptedTransport::replying(reply(200, "OK", b"text")),
            FullDisk(Recorder::new()),
        );
        c.select_file(pdf("doc.pdf")).unwrap();

        let err = c.submit_extraction().await.unwrap_err();
        assert!(matches!(err, ClientError::OutputWriteFailed { .. }));
        let notices = c.presenter().0.notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].contains("no space left on device"), "{notices:?}");
        assert!(!c.presenter().0.is_busy());
    }

    /// Panics on the first request, then answers normally.
    #[derive(Default)]
    struct PanicsOnce {
        panicked: AtomicBool,
    }

    #[async_trait]
    impl Transport for PanicsOnce {
        async fn submit(&self, _form: UploadForm) -> Result<RawResponse, ClientError> {
            if !self.panicked.swap(true, Ordering::SeqCst) {
                panic!("transport blew up");
            }
            reply(200, "OK", b"done")
        }
    }

    #[tokio::test]
    async fn panic_in_transport_still_releases_busy() {
        let mut c = controller(PanicsOnce::default());
        c.select_file(pdf("doc.pdf")).unwrap();
        let c = Arc::new(c);

        let task = tokio::spawn({
            let c = Arc::clone(&c);
            async move { c.submit_conversion().await.map(|_| ()) }
        });
        let err = task.await.unwrap_err();
        assert!(err.is_panic());

        assert!(!c.presenter().is_busy());
        assert!(!c.is_busy());
        assert!(!c.view().busy);
        assert!(c.presenter().notices().is_empty());

        // The in-flight flag was released during unwinding.
        assert!(matches!(c.submit_conversion().await.unwrap(), Submission::Delivered(_)));
    }

    /// Blocks every request until released.
    #[derive(Default)]
    struct GatedTransport {
        started: Notify,
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn submit(&self, _form: UploadForm) -> Result<RawResponse, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            self.release.notified().await;
            reply(200, "OK", b"done")
        }
    }

    #[tokio::test]
    async fn overlapping_submission_is_refused() {
        let mut c = controller(GatedTransport::default());
        c.select_file(pdf("doc.pdf")).unwrap();

        let first = c.submit_conversion();
        let second = async {
            c.transport().started.notified().await;
            assert!(c.is_busy());
            let outcome = c.submit_extraction().await;
            // The refused call must not hide the indicator of the running one.
            assert!(c.presenter().is_busy());
            c.transport().release.notify_one();
            outcome
        };

        let (first, second) = tokio::join!(first, second);
        assert!(matches!(first.unwrap(), Submission::Delivered(_)));
        assert_eq!(second.unwrap(), Submission::AlreadyInFlight);
        assert_eq!(c.transport().calls.load(Ordering::SeqCst), 1);
        assert!(!c.presenter().is_busy());

        // The flag is released, so a later submission goes through.
        c.transport().release.notify_one();
        assert!(matches!(c.submit_conversion().await.unwrap(), Submission::Delivered(_)));
    }
}
