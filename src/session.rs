//! Session state: the selected file and the chosen conversion options.
//!
//! A [`Session`] is the only mutable state the client keeps. It is owned by
//! the controller and passed nowhere else, so every transition can be tested
//! by calling methods and inspecting [`Session::view`].

use crate::config::{ClientConfig, ConversionMode};
use crate::error::ClientError;
use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// Media type a selection must declare to be accepted.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A user-chosen file held in memory.
///
/// Cloning is cheap: the contents are reference-counted [`Bytes`].
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    media_type: String,
    contents: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            contents: contents.into(),
        }
    }

    /// Display name, also sent as the multipart filename.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared media type, exactly as supplied.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn contents(&self) -> &Bytes {
        &self.contents
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// `true` when the declared media type is `application/pdf`.
    ///
    /// Compares the type's essence only: case and parameters such as
    /// `; charset=binary` are ignored. The contents are not inspected.
    pub fn declares_pdf(&self) -> bool {
        let essence = self.media_type.split(';').next().unwrap_or("").trim();
        essence.eq_ignore_ascii_case(PDF_MEDIA_TYPE)
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.contents.len())
            .finish()
    }
}

/// What a front end should currently display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    /// Name shown in the file-info panel; `None` while no file is held.
    pub file_name: Option<String>,
    /// Drop zone shown (empty state) vs. file-info panel shown.
    pub drop_zone_visible: bool,
    /// Last value the file picker reported; reset on clear so the same
    /// file can be picked again.
    pub picker_value: Option<String>,
    /// Convert and extract actions enabled.
    pub actions_enabled: bool,
    /// The single active mode.
    pub mode: ConversionMode,
    /// DPI control visible (image mode only).
    pub dpi_visible: bool,
    /// Numeric readout next to the DPI control.
    pub dpi_readout: String,
    /// Busy overlay shown.
    pub busy: bool,
}

/// Selected file plus conversion options for one session.
#[derive(Debug, Clone)]
pub struct Session {
    file: Option<SelectedFile>,
    picker_value: Option<String>,
    mode: ConversionMode,
    dpi: u32,
    dpi_min: u32,
    dpi_max: u32,
}

impl Session {
    /// Start an empty session with the configured default mode and DPI.
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            file: None,
            picker_value: None,
            mode: config.default_mode,
            dpi: config.clamp_dpi(config.default_dpi),
            dpi_min: config.dpi_min,
            dpi_max: config.dpi_max,
        }
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn mode(&self) -> ConversionMode {
        self.mode
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Hold `file` as the selection, replacing any previous one.
    ///
    /// Rejects files that do not declare `application/pdf`; on rejection
    /// nothing changes.
    pub fn select(&mut self, file: SelectedFile) -> Result<(), ClientError> {
        if !file.declares_pdf() {
            info!(
                "Rejected '{}': declared type '{}' is not {}",
                file.name(),
                file.media_type(),
                PDF_MEDIA_TYPE
            );
            return Err(ClientError::NotAPdf {
                name: file.name().to_string(),
                media_type: file.media_type().to_string(),
            });
        }
        if let Some(prev) = &self.file {
            debug!("Replacing selection '{}' with '{}'", prev.name(), file.name());
        }
        info!("Selected '{}' ({} bytes)", file.name(), file.len());
        self.picker_value = Some(file.name().to_string());
        self.file = Some(file);
        Ok(())
    }

    /// Drop the selection and reset the picker. Mode and DPI are kept.
    pub fn clear(&mut self) {
        if let Some(prev) = self.file.take() {
            info!("Cleared selection '{}'", prev.name());
        }
        self.picker_value = None;
    }

    /// Make `mode` the single active mode. Never touches the DPI value.
    pub fn set_mode(&mut self, mode: ConversionMode) {
        debug!("Mode: {} → {}", self.mode, mode);
        self.mode = mode;
    }

    /// Move the DPI control, clamped to its bounds. Returns the held value.
    pub fn set_dpi(&mut self, dpi: u32) -> u32 {
        self.dpi = dpi.clamp(self.dpi_min, self.dpi_max);
        debug!("DPI: {}", self.dpi);
        self.dpi
    }

    /// Snapshot of what should be on screen.
    pub fn view(&self, busy: bool) -> ViewState {
        ViewState {
            file_name: self.file.as_ref().map(|f| f.name().to_string()),
            drop_zone_visible: self.file.is_none(),
            picker_value: self.picker_value.clone(),
            actions_enabled: self.file.is_some(),
            mode: self.mode,
            dpi_visible: self.mode.uses_dpi(),
            dpi_readout: self.dpi.to_string(),
            busy,
        }
    }
}
