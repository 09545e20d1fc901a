//! CLI binary for pdf2pptx-client.
//!
//! A thin shim over the library crate: flags become `ClientConfig` and
//! controller actions, a spinner stands in for the busy overlay, and
//! downloads are written into the output directory.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2pptx_client::config::DEFAULT_SERVER_URL;
use pdf2pptx_client::{
    input, save_download, ClientConfig, ClientError, ConversionMode, Download, HttpTransport,
    Presenter, Submission, SubmissionController, ViewState,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Terminal presenter ───────────────────────────────────────────────────────

/// Renders notices on stderr, the busy indicator as a spinner, and saves
/// downloads into `output_dir`.
struct TerminalPresenter {
    output_dir: PathBuf,
    show_progress: bool,
    quiet: bool,
    /// Spinner text for the next busy period.
    label: Mutex<String>,
    spinner: Mutex<Option<ProgressBar>>,
    saved: Mutex<Vec<PathBuf>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TerminalPresenter {
    fn new(output_dir: PathBuf, show_progress: bool, quiet: bool) -> Self {
        Self {
            output_dir,
            show_progress,
            quiet,
            label: Mutex::new("Waiting for server…".to_string()),
            spinner: Mutex::new(None),
            saved: Mutex::new(Vec::new()),
        }
    }

    fn set_label(&self, label: impl Into<String>) {
        *lock(&self.label) = label.into();
    }

    fn saved(&self) -> Vec<PathBuf> {
        lock(&self.saved).clone()
    }

    /// Print above the spinner if one is running.
    fn eprint(&self, line: String) {
        match lock(&self.spinner).as_ref() {
            Some(bar) => bar.suspend(|| eprintln!("{line}")),
            None => eprintln!("{line}"),
        }
    }
}

impl Presenter for TerminalPresenter {
    fn on_view_changed(&self, view: &ViewState) {
        debug!(
            file = ?view.file_name,
            mode = %view.mode,
            dpi = %view.dpi_readout,
            dpi_visible = view.dpi_visible,
            actions_enabled = view.actions_enabled,
            busy = view.busy,
            "view"
        );
    }

    fn notify(&self, message: &str) {
        // Notices are never suppressed, even with --quiet.
        self.eprint(format!("{} {}", red("✘"), message));
    }

    fn set_busy(&self, busy: bool) {
        let mut spinner = lock(&self.spinner);
        if busy {
            if !self.show_progress {
                return;
            }
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            bar.set_message(lock(&self.label).clone());
            bar.enable_steady_tick(Duration::from_millis(80));
            *spinner = Some(bar);
        } else if let Some(bar) = spinner.take() {
            bar.finish_and_clear();
        }
    }

    fn deliver(&self, download: &Download) -> Result<(), ClientError> {
        let path = save_download(&self.output_dir, download)?;
        if !self.quiet {
            self.eprint(format!(
                "{} {}  {}",
                green("✔"),
                bold(&path.display().to_string()),
                dim(&format!("{} bytes", download.contents.len())),
            ));
        }
        lock(&self.saved).push(path);
        Ok(())
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert to PowerPoint, one image per page at 150 DPI
  pdf2pptx convert deck.pdf --dpi 150

  # Editable slides (text and images separated)
  pdf2pptx convert deck.pdf --mode separated -o out/

  # Plain-text extraction
  pdf2pptx extract report.pdf

  # Talk to another server
  pdf2pptx --server http://convert.internal:8000 convert deck.pdf

OUTPUT FILES:
  convert   →  converted_presentation.pptx
  extract   →  extracted_text.txt
  Both are written into --output-dir (default: current directory) and
  replace any existing file of the same name.

ENVIRONMENT VARIABLES:
  PDF2PPTX_SERVER       Base URL of the conversion service
  PDF2PPTX_OUTPUT_DIR   Directory downloads are written into
  PDF2PPTX_TIMEOUT      Request timeout in seconds (unset: no timeout)
  PDF2PPTX_MODE         Default conversion mode
  PDF2PPTX_DPI          Default DPI
  RUST_LOG              Log filter, overrides --verbose / --quiet
"#;

/// Submit PDFs to a conversion service and save the results.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2pptx",
    version,
    about = "Submit PDFs to a conversion service (PowerPoint or plain text)",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the conversion service.
    #[arg(long, global = true, env = "PDF2PPTX_SERVER", default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Directory downloads are written into.
    #[arg(short, long, global = true, env = "PDF2PPTX_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Request timeout in seconds. Unset waits indefinitely.
    #[arg(long, global = true, env = "PDF2PPTX_TIMEOUT")]
    timeout: Option<u64>,

    /// Declared media type of the input, instead of guessing from the extension.
    #[arg(long, global = true)]
    media_type: Option<String>,

    /// Disable the spinner.
    #[arg(long, global = true, env = "PDF2PPTX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2PPTX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2PPTX_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a PDF to PowerPoint (POST /convert).
    Convert {
        /// PDF file to submit.
        file: PathBuf,

        /// Conversion mode.
        #[arg(long, env = "PDF2PPTX_MODE", value_enum, default_value = "image")]
        mode: ModeArg,

        /// Page-image DPI (72–400). Only affects `image` mode.
        #[arg(long, env = "PDF2PPTX_DPI", default_value_t = 200,
              value_parser = clap::value_parser!(u32).range(72..=400))]
        dpi: u32,
    },

    /// Extract the text of a PDF (POST /extract_text).
    Extract {
        /// PDF file to submit.
        file: PathBuf,
    },

    /// List conversion modes.
    Modes,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Image,
    Separated,
}

impl From<ModeArg> for ConversionMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Image => ConversionMode::Image,
            ModeArg::Separated => ConversionMode::Separated,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep INFO logs out
    // of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Pick the action ──────────────────────────────────────────────────
    let (path, conversion) = match &cli.command {
        Command::Modes => {
            list_modes();
            return Ok(ExitCode::SUCCESS);
        }
        Command::Convert { file, mode, dpi } => (file.clone(), Some((*mode, *dpi))),
        Command::Extract { file } => (file.clone(), None),
    };

    // ── Build config and controller ──────────────────────────────────────
    let config = build_config(&cli)?;
    let transport = HttpTransport::new(&config).context("Failed to set up HTTP client")?;
    let presenter = TerminalPresenter::new(cli.output_dir.clone(), show_progress, cli.quiet);
    let mut controller = SubmissionController::new(config, transport, presenter);

    let file = input::load_file(&path, cli.media_type.as_deref())
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if controller.select_file(file).is_err() {
        // The rejection notice has already been shown.
        return Ok(ExitCode::from(2));
    }

    // ── Submit ───────────────────────────────────────────────────────────
    let outcome = match conversion {
        Some((mode, dpi)) => {
            controller.select_mode(mode.into());
            controller.adjust_dpi(dpi);
            controller.presenter().set_label(format!(
                "Converting {} ({})…",
                path.display(),
                describe_options(&controller.view())
            ));
            controller.submit_conversion().await
        }
        None => {
            controller
                .presenter()
                .set_label(format!("Extracting text from {}…", path.display()));
            controller.submit_extraction().await
        }
    };

    match outcome {
        Ok(Submission::Delivered(_)) => {
            for saved in controller.presenter().saved() {
                // Paths on stdout so the command composes in scripts.
                println!("{}", saved.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Ok(other) => {
            debug!("Nothing submitted: {other:?}");
            Ok(ExitCode::FAILURE)
        }
        // The failure notice has already been shown.
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .server_url(cli.server.trim())
        .request_timeout_secs(cli.timeout);

    if let Command::Convert { mode, dpi, .. } = &cli.command {
        builder = builder.default_mode((*mode).into()).default_dpi(*dpi);
    }

    builder.build().context("Invalid configuration")
}

fn list_modes() {
    for mode in ConversionMode::ALL {
        let dpi = if mode.uses_dpi() { "  (uses --dpi)" } else { "" };
        println!("{:<10} {}{}", mode.as_str(), bold(mode.label()), dim(dpi));
        println!("{:<10} {}", "", mode.help());
    }
}

fn describe_options(view: &ViewState) -> String {
    if view.dpi_visible {
        format!("{}, {} DPI", view.mode, view.dpi_readout)
    } else {
        view.mode.to_string()
    }
}
