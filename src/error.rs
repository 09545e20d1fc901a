//! Error types for the pdf2pptx-client library.
//!
//! A single enum, [`ClientError`], covers every way an operation can fail.
//! Variants are grouped by where the failure happens:
//!
//! * **Input**: the user picked something that cannot be submitted. Raised
//!   synchronously at selection time, before any network traffic.
//! * **Server**: the service answered with a non-2xx status. The message is
//!   the server's `detail` when it sent one, otherwise the status text.
//! * **Transport / output**: anything unexpected on the client side, such as
//!   a dropped connection or a download that could not be written.
//!
//! Every variant's `Display` text is what ends up in the user-visible notice,
//! so messages are written for a person, not for a log parser.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2pptx-client library.
#[derive(Debug, Error)]
pub enum ClientError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The selected file does not declare a PDF media type.
    #[error("Please upload a PDF file.")]
    NotAPdf {
        name: String,
        media_type: String,
    },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// A path existed but could not be read for another reason.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Server errors ─────────────────────────────────────────────────────
    /// The service answered with a non-success status.
    ///
    /// `message` is already resolved: server `detail`, else status text,
    /// else the operation's generic failure text.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    // ── Transport errors ──────────────────────────────────────────────────
    /// The request could not be sent or the response could not be read.
    #[error("{0}")]
    Transport(String),

    /// The request exceeded the configured timeout.
    #[error("Request to '{url}' timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// Endpoint URL could not be built from the configured server URL.
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not write a delivered download.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// HTTP status carried by a server rejection, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` for failures detected before anything was sent.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ClientError::NotAPdf { .. }
                | ClientError::FileNotFound { .. }
                | ClientError::PermissionDenied { .. }
                | ClientError::ReadFailed { .. }
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}
