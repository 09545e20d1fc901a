//! # pdf2pptx-client
//!
//! Client for a PDF conversion service: select a PDF, pick a conversion mode
//! and DPI, submit it, receive the converted file.
//!
//! The service exposes two endpoints and this crate speaks both:
//!
//! | Endpoint | Form fields | Result |
//! |----------|-------------|--------|
//! | `POST /convert` | `file`, `mode`, `dpi` | `converted_presentation.pptx` |
//! | `POST /extract_text` | `file` | `extracted_text.txt` |
//!
//! ## Flow
//!
//! ```text
//! user action ──▶ SubmissionController ──▶ Transport (HTTP multipart)
//!                        │                       │
//!                        ◀────── RawResponse ────┘
//!                        │
//!                        └──▶ Presenter (view, notices, busy indicator, downloads)
//! ```
//!
//! The controller owns the only mutable state (the [`Session`]); the network
//! and the user interface sit behind the [`Transport`] and [`Presenter`]
//! traits, so a terminal, a GUI or a test harness can drive the same logic.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2pptx_client::{
//!     input, ClientConfig, ConversionMode, HttpTransport, Recorder, SubmissionController,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .server_url("http://127.0.0.1:8000")
//!         .build()?;
//!     let transport = HttpTransport::new(&config)?;
//!     let mut controller = SubmissionController::new(config, transport, Recorder::new());
//!
//!     controller.select_file(input::load_file("deck.pdf", None).await?)?;
//!     controller.select_mode(ConversionMode::Image);
//!     controller.adjust_dpi(150);
//!     controller.submit_conversion().await?;
//!
//!     for download in controller.presenter().downloads() {
//!         std::fs::write(&download.filename, &download.contents)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2pptx` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod controller;
pub mod error;
pub mod input;
pub mod presenter;
pub mod protocol;
pub mod session;
pub mod transport;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder, ConversionMode};
pub use controller::{Submission, SubmissionController};
pub use error::ClientError;
pub use presenter::{save_download, NoopPresenter, Presenter, PresenterEvent, Recorder};
pub use protocol::{Download, Operation, RawResponse, UploadForm};
pub use session::{SelectedFile, Session, ViewState};
pub use transport::{HttpTransport, Transport};
