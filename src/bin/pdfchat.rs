//! CLI binary for pdf-chat.
//!
//! A thin shim over the library crate: maps flags to `SessionConfig`, sets
//! up logging and terminal progress, and hands stdin/stdout to the app.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_chat::{
    App, CommandRunner, CommandSpec, ExtractionProgressCallback, ModelRunner, PdfChatError,
    ProgressCallback, SessionConfig, StdConsole, DEFAULT_MODEL,
};
use std::ffi::OsString;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Page progress bar on stderr. A fresh bar is drawn for every document.
struct CliProgressCallback {
    bar: Mutex<Option<ProgressBar>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                f(bar);
            }
        }
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        let bar = ProgressBar::new(total_pages as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));

        self.errors.store(0, Ordering::SeqCst);
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn on_page_complete(&self, _page_num: usize, _total: usize) {
        self.with_bar(|bar| bar.inc(1));
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.with_bar(|bar| {
            bar.println(format!("  {} Page {:>3}/{:<3}  {}", red("✗"), page_num, total, red(&msg)));
        });
    }

    fn on_extraction_complete(&self, total_pages: usize) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
        if self.errors.load(Ordering::SeqCst) == 0 {
            eprintln!("{} {} pages extracted", green("✔"), bold(&total_pages.to_string()));
        }
    }
}

// ── Model runner with a spinner ──────────────────────────────────────────────

/// Shows a spinner on stderr while the model is thinking.
struct SpinnerRunner {
    inner: CommandRunner,
    label: String,
    enabled: bool,
}

impl ModelRunner for SpinnerRunner {
    async fn run(&self, prompt: &str) -> Result<String, PdfChatError> {
        if !self.enabled {
            return self.inner.run(prompt).await;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        spinner.set_message(format!("Waiting for {}…", self.label));
        spinner.enable_steady_tick(Duration::from_millis(80));

        let result = self.inner.run(prompt).await;
        spinner.finish_and_clear();
        result
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Chat about one document
  pdfchat report.pdf

  # Scanned documents: OCR every page
  pdfchat -ocr scan1.pdf scan2.pdf

  # Start with no document and load one interactively
  pdfchat

  # Another local model, German OCR
  pdfchat --model mistral --ocr-lang deu brief.pdf

INTERACTIVE:
  Type a question at "You:". Type "exit" to leave the chat for the current
  document, and "exit" again at the document prompt to quit. After each
  answer you can save it as md, txt, pptx, docx (via pandoc) or xlsx.

ENVIRONMENT VARIABLES:
  PDFCHAT_MODEL           Model name passed to the runner
  PDFCHAT_MODEL_COMMAND   Runner program (invoked as `<cmd> run <model>`)
  PDFCHAT_CONVERTER       Document converter for txt/pptx/docx exports
  PDFCHAT_TESSERACT       OCR engine binary
  PDFCHAT_OCR_LANG        OCR language code
  PDFCHAT_MAX_PIXELS      Largest rendered page dimension for OCR
  PDFIUM_LIB_PATH         Path to the libpdfium shared library
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Chat with PDF documents through a local language model.
#[derive(Parser, Debug)]
#[command(
    name = "pdfchat",
    version,
    about = "Convert PDFs to Markdown and chat about them with a local language model",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files to load before the interactive prompt.
    paths: Vec<String>,

    /// Extract text with OCR instead of the embedded text layer (also `-ocr`).
    #[arg(long, env = "PDFCHAT_OCR")]
    ocr: bool,

    /// Model name passed to the runner.
    #[arg(long, env = "PDFCHAT_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Program that serves the model; invoked as `<cmd> run <model>`.
    #[arg(long, env = "PDFCHAT_MODEL_COMMAND", default_value = "ollama")]
    model_command: String,

    /// Document converter for txt/pptx/docx exports.
    #[arg(long, env = "PDFCHAT_CONVERTER", default_value = "pandoc")]
    converter: String,

    /// OCR engine binary.
    #[arg(long, env = "PDFCHAT_TESSERACT", default_value = "tesseract")]
    tesseract: String,

    /// OCR language code.
    #[arg(long, env = "PDFCHAT_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// Rendering DPI for OCR (72–400).
    #[arg(long, env = "PDFCHAT_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Cap on either dimension of a rendered page image, in pixels.
    #[arg(long, env = "PDFCHAT_MAX_PIXELS", default_value_t = 2000,
          value_parser = clap::value_parser!(u32).range(100..))]
    max_pixels: u32,

    /// Disable progress bar and spinner.
    #[arg(long, env = "PDFCHAT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFCHAT_VERBOSE")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, env = "PDFCHAT_QUIET")]
    quiet: bool,
}

/// Accept the single-dash `-ocr` spelling by rewriting it before clap sees
/// it. Anything after `--` is left alone.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut positional_only = false;
    args.into_iter()
        .map(|arg| {
            if arg == "--" {
                positional_only = true;
            }
            if !positional_only && arg == "-ocr" {
                OsString::from("--ocr")
            } else {
                arg
            }
        })
        .collect()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    // ── Logging setup ────────────────────────────────────────────────────
    // Interactive output goes to stdout; logs stay on stderr and default to
    // warnings only so they don't interleave with the chat.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let show_progress = !cli.quiet && !cli.no_progress;
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    tracing::debug!("{:?}", config);

    let runner = SpinnerRunner {
        inner: CommandRunner::new(config.model_command.clone()),
        label: cli.model.clone(),
        enabled: show_progress,
    };

    if !cli.quiet {
        eprintln!(
            "{}",
            dim(&format!("model: {}  converter: {}", config.model_command, config.converter_program))
        );
    }

    let app = App::new(config, runner);
    let mut console = StdConsole::stdio();
    app.run(&mut console, &cli.paths)
        .await
        .context("Terminal I/O failed")?;

    Ok(())
}

/// Map CLI args to `SessionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SessionConfig> {
    let mut builder = SessionConfig::builder()
        .ocr(cli.ocr)
        .model_command(CommandSpec::new(&cli.model_command).args(["run", cli.model.as_str()]))
        .converter_program(&cli.converter)
        .ocr_program(&cli.tesseract)
        .ocr_language(&cli.ocr_lang)
        .dpi(cli.dpi)
        .max_rendered_pixels(cli.max_pixels);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
