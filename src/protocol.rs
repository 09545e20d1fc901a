//! Wire contract with the conversion service.
//!
//! ```text
//! POST /convert        file=<pdf> mode=<image|separated> dpi=<int>  → converted_presentation.pptx
//! POST /extract_text   file=<pdf>                                   → extracted_text.txt
//! ```
//!
//! Failures come back as a non-2xx status. The body is usually JSON with a
//! `detail` string; when it is not JSON the status text is used instead.

use crate::config::ConversionMode;
use crate::session::{SelectedFile, PDF_MEDIA_TYPE};
use bytes::Bytes;
use serde_json::Value;

pub const CONVERT_ENDPOINT: &str = "/convert";
pub const EXTRACT_TEXT_ENDPOINT: &str = "/extract_text";

pub const FIELD_FILE: &str = "file";
pub const FIELD_MODE: &str = "mode";
pub const FIELD_DPI: &str = "dpi";

pub const CONVERTED_FILENAME: &str = "converted_presentation.pptx";
pub const EXTRACTED_FILENAME: &str = "extracted_text.txt";

/// The two submissions a user can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Convert,
    ExtractText,
}

impl Operation {
    pub fn endpoint(self) -> &'static str {
        match self {
            Operation::Convert => CONVERT_ENDPOINT,
            Operation::ExtractText => EXTRACT_TEXT_ENDPOINT,
        }
    }

    /// Fixed name the successful result is saved under.
    pub fn download_filename(self) -> &'static str {
        match self {
            Operation::Convert => CONVERTED_FILENAME,
            Operation::ExtractText => EXTRACTED_FILENAME,
        }
    }

    /// Reason used when the server gives nothing better.
    pub fn generic_failure(self) -> &'static str {
        match self {
            Operation::Convert => "Conversion failed",
            Operation::ExtractText => "Extraction failed",
        }
    }

    /// Noun used in notices: "An error occurred during {noun}: …".
    pub fn noun(self) -> &'static str {
        match self {
            Operation::Convert => "conversion",
            Operation::ExtractText => "extraction",
        }
    }

    /// Full text of the blocking notice for a failed submission.
    pub fn failure_notice(self, reason: &str) -> String {
        format!("An error occurred during {}: {}", self.noun(), reason)
    }
}

/// A multipart body ready to send: one file part plus text fields, in order.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub operation: Operation,
    pub file: SelectedFile,
    pub fields: Vec<(&'static str, String)>,
}

impl UploadForm {
    /// `file`, `mode`, `dpi`. The DPI is sent for every mode, not just `image`.
    pub fn conversion(file: SelectedFile, mode: ConversionMode, dpi: u32) -> Self {
        Self {
            operation: Operation::Convert,
            file,
            fields: vec![(FIELD_MODE, mode.as_str().to_string()), (FIELD_DPI, dpi.to_string())],
        }
    }

    /// `file` only.
    pub fn extraction(file: SelectedFile) -> Self {
        Self {
            operation: Operation::ExtractText,
            file,
            fields: Vec::new(),
        }
    }

    /// Content type for the file part. The essence is always
    /// `application/pdf` since only PDFs get this far.
    pub fn file_content_type(&self) -> &'static str {
        PDF_MEDIA_TYPE
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Reason phrase for the status, if one is known.
    pub status_text: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A successful result, to be handed to the presenter as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub content_type: Option<String>,
    pub contents: Bytes,
}

/// Human-readable reason for a failed response.
///
/// 1. Body parses as JSON other than `null`: use a truthy `detail`, else the
///    generic text.
/// 2. Body is not JSON, or is `null`: use the status text, else the generic
///    text.
pub fn failure_reason(operation: Operation, response: &RawResponse) -> String {
    let generic = operation.generic_failure();
    match serde_json::from_slice::<Value>(&response.body) {
        // A bare `null` body has no fields to read; treat it like a body
        // that failed to parse.
        Ok(Value::Null) | Err(_) => response
            .status_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(generic)
            .to_string(),
        // Only an object can carry `detail`; arrays and scalars fall through.
        Ok(json) => json
            .get("detail")
            .cloned()
            .and_then(detail_text)
            .unwrap_or_else(|| generic.to_string()),
    }
}

/// Display text for a `detail` value, or `None` when it is falsy
/// (`null`, `false`, zero or the empty string).
fn detail_text(detail: Value) -> Option<String> {
    match detail {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
