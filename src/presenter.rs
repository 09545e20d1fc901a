//! Presentation seam: everything the user sees or receives.
//!
//! The controller never prints, never draws and never writes files. It
//! reports through a [`Presenter`]:
//!
//! * **view changes** after every state transition,
//! * **notices**, blocking messages such as "Please upload a PDF file.",
//! * the **busy indicator**, shown for the duration of a request,
//! * **downloads**, the bytes of a successful result under a fixed name.
//!
//! A terminal front end renders a spinner and writes into a directory; a GUI
//! would toggle an overlay and open a save dialog. [`Recorder`] keeps every
//! event in memory, which is what the tests use.
//!
//! # Example
//!
//! ```rust
//! use pdf2pptx_client::{Presenter, ViewState};
//!
//! struct Log;
//!
//! impl Presenter for Log {
//!     fn notify(&self, message: &str) {
//!         eprintln!("!! {message}");
//!     }
//!
//!     fn on_view_changed(&self, view: &ViewState) {
//!         eprintln!("file: {:?}", view.file_name);
//!     }
//! }
//! ```

use crate::error::ClientError;
use crate::protocol::Download;
use crate::session::ViewState;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Receives user-visible effects from the controller.
///
/// All methods default to no-ops so implementations only override what they
/// display. Must be `Send + Sync`: submissions run on the tokio runtime and
/// may be awaited from any worker thread.
pub trait Presenter: Send + Sync {
    /// Called after every state change with a fresh snapshot.
    fn on_view_changed(&self, view: &ViewState) {
        let _ = view;
    }

    /// Show a blocking notice.
    fn notify(&self, message: &str) {
        let _ = message;
    }

    /// Show (`true`) or hide (`false`) the busy indicator.
    fn set_busy(&self, busy: bool) {
        let _ = busy;
    }

    /// Hand a successful result to the user.
    ///
    /// An `Err` is reported as a failed submission, with the same notice
    /// channel as a server error.
    fn deliver(&self, download: &Download) -> Result<(), ClientError> {
        let _ = download;
        Ok(())
    }
}

/// A presenter that shows nothing and discards downloads.
pub struct NoopPresenter;

impl Presenter for NoopPresenter {}

impl<P: Presenter + ?Sized> Presenter for Arc<P> {
    fn on_view_changed(&self, view: &ViewState) {
        (**self).on_view_changed(view)
    }

    fn notify(&self, message: &str) {
        (**self).notify(message)
    }

    fn set_busy(&self, busy: bool) {
        (**self).set_busy(busy)
    }

    fn deliver(&self, download: &Download) -> Result<(), ClientError> {
        (**self).deliver(download)
    }
}

// ── Recorder ─────────────────────────────────────────────────────────────

/// One thing a [`Recorder`] saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    View(ViewState),
    Notice(String),
    Busy(bool),
    Download(Download),
}

/// Headless presenter that keeps every event in order.
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<PresenterEvent>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PresenterEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<PresenterEvent> {
        self.lock().clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                PresenterEvent::Notice(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn downloads(&self) -> Vec<Download> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                PresenterEvent::Download(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    /// Latest view snapshot, if any was reported.
    pub fn last_view(&self) -> Option<ViewState> {
        self.lock().iter().rev().find_map(|e| match e {
            PresenterEvent::View(v) => Some(v.clone()),
            _ => None,
        })
    }

    /// Whether the busy indicator is currently shown.
    pub fn is_busy(&self) -> bool {
        self.lock()
            .iter()
            .rev()
            .find_map(|e| match e {
                PresenterEvent::Busy(b) => Some(*b),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl Presenter for Recorder {
    fn on_view_changed(&self, view: &ViewState) {
        self.lock().push(PresenterEvent::View(view.clone()));
    }

    fn notify(&self, message: &str) {
        self.lock().push(PresenterEvent::Notice(message.to_string()));
    }

    fn set_busy(&self, busy: bool) {
        self.lock().push(PresenterEvent::Busy(busy));
    }

    fn deliver(&self, download: &Download) -> Result<(), ClientError> {
        self.lock().push(PresenterEvent::Download(download.clone()));
        Ok(())
    }
}

// ── Saving downloads ─────────────────────────────────────────────────────

/// Write `download` into `dir` under its own file name and return the path.
///
/// The write is atomic: contents go to a temp file in `dir` which is then
/// renamed over the target, so an interrupted write never leaves a partial
/// file behind. An existing file with the same name is replaced.
pub fn save_download(dir: &Path, download: &Download) -> Result<PathBuf, ClientError> {
    let name = Path::new(&download.filename)
        .file_name()
        .ok_or_else(|| ClientError::Internal(format!("invalid download name '{}'", download.filename)))?;
    let path = dir.join(name);

    let write_err = |source: std::io::Error| ClientError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(write_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(&download.contents).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(&path).map_err(|e| write_err(e.error))?;

    debug!("Wrote {} bytes to {}", download.contents.len(), path.display());
    info!("Saved {}", path.display());
    Ok(path)
}
