//! Configuration types for the conversion client.
//!
//! Everything that controls how the client talks to the service lives in
//! [`ClientConfig`], built via its [`ClientConfigBuilder`]. Per-session
//! choices (the selected file, the active mode, the current DPI) are *not*
//! here; they live in [`crate::session::Session`] and start from the
//! defaults recorded in this struct.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default service address used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

/// Configuration for a [`crate::controller::SubmissionController`].
///
/// # Example
/// ```rust
/// use pdf2pptx_client::{ClientConfig, ConversionMode};
///
/// let config = ClientConfig::builder()
///     .server_url("http://localhost:8000")
///     .default_mode(ConversionMode::Separated)
///     .default_dpi(300)
///     .build()
///     .unwrap();
/// assert_eq!(config.default_dpi, 300);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the conversion service. Endpoints are joined onto it.
    /// Default: `http://127.0.0.1:8000`.
    pub server_url: String,

    /// Mode pre-selected when a session starts. Default: [`ConversionMode::Image`].
    pub default_mode: ConversionMode,

    /// DPI the slider starts at. Default: 200.
    pub default_dpi: u32,

    /// Lowest DPI the slider allows. Default: 72.
    pub dpi_min: u32,

    /// Highest DPI the slider allows. Default: 400.
    pub dpi_max: u32,

    /// Slider increment. Default: 10.
    ///
    /// Informational only: the session accepts any in-range value, the
    /// step is what an interactive front end should snap to.
    pub dpi_step: u32,

    /// Per-request timeout in seconds. Default: `None` (wait for the
    /// transport to resolve, however long that takes).
    pub request_timeout_secs: Option<u64>,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            default_mode: ConversionMode::default(),
            default_dpi: 200,
            dpi_min: 72,
            dpi_max: 400,
            dpi_step: 10,
            request_timeout_secs: None,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Clamp a DPI value into `[dpi_min, dpi_max]`.
    pub fn clamp_dpi(&self, dpi: u32) -> u32 {
        dpi.clamp(self.dpi_min, self.dpi_max)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    pub fn default_mode(mut self, mode: ConversionMode) -> Self {
        self.config.default_mode = mode;
        self
    }

    pub fn default_dpi(mut self, dpi: u32) -> Self {
        self.config.default_dpi = dpi;
        self
    }

    /// Set the slider bounds. `min` and `max` are swapped if given reversed.
    pub fn dpi_bounds(mut self, min: u32, max: u32) -> Self {
        self.config.dpi_min = min.min(max);
        self.config.dpi_max = max.max(min);
        self
    }

    pub fn dpi_step(mut self, step: u32) -> Self {
        self.config.dpi_step = step.max(1);
        self
    }

    pub fn request_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.config.request_timeout_secs = secs.filter(|s| *s > 0);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, ClientError> {
        let c = &self.config;
        if c.server_url.trim().is_empty() {
            return Err(ClientError::InvalidConfig("server URL must not be empty".into()));
        }
        if !(c.server_url.starts_with("http://") || c.server_url.starts_with("https://")) {
            return Err(ClientError::InvalidConfig(format!(
                "server URL must start with http:// or https://, got '{}'",
                c.server_url
            )));
        }
        if c.dpi_min == 0 {
            return Err(ClientError::InvalidConfig("DPI lower bound must be ≥ 1".into()));
        }
        if c.default_dpi < c.dpi_min || c.default_dpi > c.dpi_max {
            return Err(ClientError::InvalidConfig(format!(
                "default DPI must be {}–{}, got {}",
                c.dpi_min, c.dpi_max, c.default_dpi
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Conversion mode sent as the `mode` form field of `POST /convert`.
///
/// | Mode | Result |
/// |------|--------|
/// | `image` | every page rendered at the chosen DPI, one picture per slide (default) |
/// | `separated` | text boxes and images placed separately, editable |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMode {
    /// Page images. The only mode that uses the DPI setting.
    #[default]
    Image,
    /// Text and images extracted separately.
    Separated,
}

impl ConversionMode {
    /// Every mode, in display order.
    pub const ALL: [ConversionMode; 2] = [ConversionMode::Image, ConversionMode::Separated];

    /// Value sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            ConversionMode::Image => "image",
            ConversionMode::Separated => "separated",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConversionMode::Image => "Image-based (High Fidelity)",
            ConversionMode::Separated => "Text-Image Separation (Editable)",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            ConversionMode::Image => {
                "Converts pages to images. Reliable, preserves layout and watermarks."
            }
            ConversionMode::Separated => "Extracts text and images into editable slide elements.",
        }
    }

    /// Whether the DPI control applies to this mode.
    pub fn uses_dpi(self) -> bool {
        matches!(self, ConversionMode::Image)
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionMode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" | "images" => Ok(ConversionMode::Image),
            "separated" | "separate" | "editable" => Ok(ConversionMode::Separated),
            other => Err(ClientError::InvalidConfig(format!(
                "unknown conversion mode '{other}' (expected: image, separated)"
            ))),
        }
    }
}
