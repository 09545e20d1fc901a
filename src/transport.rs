//! HTTP transport: send an [`UploadForm`], get back a [`RawResponse`].
//!
//! [`Transport`] is the seam between the controller and the network. The
//! controller never looks at HTTP types; it only sees status, status text
//! and body bytes. [`HttpTransport`] is the reqwest implementation used in
//! production, tests substitute their own.
//!
//! No retries and no cancellation happen here. A timeout is applied only
//! when one is configured.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::protocol::{Operation, RawResponse, UploadForm, FIELD_FILE};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Sends one multipart submission and returns whatever the server answered.
///
/// Non-2xx statuses are **not** errors at this layer; they come back as an
/// `Ok(RawResponse)` so the caller can read the failure body. `Err` means the
/// exchange itself failed (connection refused, body stream broke, timeout).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit(&self, form: UploadForm) -> Result<RawResponse, ClientError>;
}

/// reqwest-backed [`Transport`] talking to a real service.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    timeout_secs: Option<u64>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.server_url).map_err(|e| ClientError::InvalidUrl {
            url: config.server_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                url: config.server_url.clone(),
                reason: "URL cannot be used as a base".into(),
            });
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ClientError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            timeout_secs: config.request_timeout_secs,
        })
    }

    /// Endpoint URL for `operation`, keeping any path prefix of the base URL.
    ///
    /// `http://host/app/` + `/convert` → `http://host/app/convert`
    pub fn endpoint_url(&self, operation: Operation) -> Url {
        let mut url = self.base_url.clone();
        let path = format!(
            "{}{}",
            self.base_url.path().trim_end_matches('/'),
            operation.endpoint()
        );
        url.set_path(&path);
        url.set_query(None);
        url
    }

    fn build_form(form: &UploadForm) -> Result<Form, ClientError> {
        // Shares the `Bytes` buffer.
        let body = reqwest::Body::from(form.file.contents().clone());
        let part = Part::stream_with_length(body, form.file.len() as u64)
            .file_name(form.file.name().to_string())
            .mime_str(form.file_content_type())?;

        let mut multipart = Form::new().part(FIELD_FILE, part);
        for (name, value) in &form.fields {
            multipart = multipart.text(*name, value.clone());
        }
        Ok(multipart)
    }

    fn map_send_error(&self, url: &Url, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout {
                url: url.to_string(),
                secs: self.timeout_secs.unwrap_or_default(),
            }
        } else {
            ClientError::Transport(error_chain(&e))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit(&self, form: UploadForm) -> Result<RawResponse, ClientError> {
        let url = self.endpoint_url(form.operation);
        let body = Self::build_form(&form)?;
        info!(
            "POST {} ({} bytes, '{}')",
            url,
            form.file.len(),
            form.file.name()
        );

        let start = Instant::now();
        let mut request = self.client.post(url.clone()).multipart(body);
        if let Some(secs) = self.timeout_secs {
            request = request.timeout(Duration::from_secs(secs));
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;

        let status = response.status();
        let status_text = status_text(&response);
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;

        let elapsed = start.elapsed();
        if status.is_success() {
            debug!("{} → {} ({} bytes, {:?})", url, status, body.len(), elapsed);
        } else {
            warn!("{} → {} ({} bytes, {:?})", url, status, body.len(), elapsed);
        }

        Ok(RawResponse {
            status: status.as_u16(),
            status_text,
            content_type,
            body,
        })
    }
}

/// Reason phrase the server sent, falling back to the canonical one.
///
/// hyper only records the phrase when it differs from the canonical text.
fn status_text(response: &reqwest::Response) -> Option<String> {
    response
        .extensions()
        .get::<hyper::ext::ReasonPhrase>()
        .map(|phrase| String::from_utf8_lossy(phrase.as_bytes()).into_owned())
        .or_else(|| response.status().canonical_reason().map(str::to_string))
}

/// `Display` of an error followed by its sources, joined with ": ".
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        let text = s.to_string();
        if !msg.contains(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = s.source();
    }
    msg
}
