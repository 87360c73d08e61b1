//! CLI binary for pdf2tex.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, runs the two output stages, and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2tex::{
    extract_to_file, reformat_to_file, ExtractionConfig, ExtractionProgressCallback,
    ProgressCallback,
};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-page log
/// lines using [indicatif]. Pages arrive strictly in order, but per-page
/// start times are still keyed by page number so the callback stays correct
/// for any driver.
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Per-page wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically
    /// by `on_extraction_start` (called before any pages are processed).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_extraction_start

        // Initial style: spinner only (no counter until we know the total).
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Loading model and PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }

    /// Clear the bar if extraction bailed out before completing.
    fn finish(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        // Switch from spinner-only style to full progress bar now that we
        // know the actual page count.
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Starting OCR of {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.start_times
            .lock()
            .unwrap()
            .insert(page_num, Instant::now());
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&page_num)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{text_len:>5} chars")),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&page_num)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            let truncated: String = error.chars().take(79).collect();
            format!("{truncated}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages recognised successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages recognised  ({} failed)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (writes doc_output.docx and tex_output.tex)
  pdf2tex --pdf_name document.pdf

  # Name both outputs
  pdf2tex --pdf_name paper.pdf --doc_name paper.docx --tex_name paper.tex

  # Point at the model directory explicitly
  pdf2tex --pdf_name scan.pdf --model-dir ~/models/got-ocr2

  # Quiet batch run
  pdf2tex --pdf_name scan.pdf --quiet --no-progress

MODEL DIRECTORY:
  The OCR model is loaded from a directory containing four files:
    config.json      image size, normalisation constants, token ids
    tokenizer.json   tokenizer definition
    encoder.onnx     vision encoder graph
    decoder.onnx     autoregressive text decoder graph
  Pass it with --model-dir or export PDF2TEX_MODEL_DIR.

ENVIRONMENT VARIABLES:
  PDF2TEX_MODEL_DIR  Directory holding the ONNX model files
  PDFIUM_LIB_PATH    Path to an existing libpdfium shared library
  RUST_LOG           Log filter override (tracing_subscriber syntax)

SETUP:
  1. Install pdfium:   download a release from bblanchon/pdfium-binaries and
                       export PDFIUM_LIB_PATH=/path/to/libpdfium.so, or place
                       the library where the system loader finds it.
  2. Fetch the model:  put the four model files in one directory and export
                       PDF2TEX_MODEL_DIR=/path/to/that/directory.
  3. Convert:          pdf2tex --pdf_name document.pdf
"#;

/// Convert PDF files to DOCX and LaTeX using a local OCR model.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2tex",
    version,
    about = "Convert PDF files to DOCX and LaTeX using a local OCR model",
    long_about = "Convert PDF documents to an intermediate .docx transcript and a final LaTeX \
article using a local ONNX image-to-text model. Pages are rasterised with pdfium, recognised \
one at a time, and reassembled with titles, authors and footnotes rewritten as LaTeX.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the PDF to convert.
    #[arg(long = "pdf_name", value_name = "PDF")]
    pdf_name: PathBuf,

    /// Write the intermediate transcript to this .docx file.
    #[arg(
        long = "doc_name",
        value_name = "DOCX",
        default_value = "doc_output.docx"
    )]
    doc_name: PathBuf,

    /// Write the LaTeX article to this .tex file.
    #[arg(
        long = "tex_name",
        value_name = "TEX",
        default_value = "tex_output.tex"
    )]
    tex_name: PathBuf,

    /// Directory holding the ONNX model files.
    #[arg(long, env = "PDF2TEX_MODEL_DIR", value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// Disable progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
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

    if !cli.quiet {
        println!("Converting {} to DOCX and LaTeX...", cli.pdf_name.display());
        println!("DOCX output will be saved to {}", cli.doc_name.display());
        println!("LaTeX output will be saved to {}", cli.tex_name.display());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let cli_cb = if show_progress {
        Some(CliProgressCallback::new_dynamic())
    } else {
        None
    };
    let progress_cb: Option<ProgressCallback> = cli_cb
        .clone()
        .map(|cb| cb as Arc<dyn ExtractionProgressCallback>);

    let config = build_config(&cli, progress_cb)?;

    // ── Stage 1: PDF → DOCX ──────────────────────────────────────────────
    match extract_to_file(&cli.pdf_name, &cli.doc_name, &config) {
        Ok(stats) => {
            if !cli.quiet {
                eprintln!(
                    "{}  {}/{} pages  {}ms  →  {}",
                    if stats.failed_pages == 0 {
                        green("✔")
                    } else {
                        cyan("⚠")
                    },
                    stats.processed_pages,
                    stats.total_pages,
                    stats.total_duration_ms,
                    bold(&cli.doc_name.display().to_string()),
                );
            }
        }
        Err(e) => {
            eprintln!("{} {}", red("✗"), e);
        }
    }

    // Clear a spinner left behind if extraction bailed out early.
    if let Some(ref cb) = cli_cb {
        cb.finish();
    }

    // ── Stage 2: DOCX → LaTeX ────────────────────────────────────────────
    // Runs even when stage 1 failed: a .docx left at the same path by an
    // earlier run still converts.
    match reformat_to_file(&cli.doc_name, &cli.tex_name) {
        Ok(()) => {
            if !cli.quiet {
                eprintln!(
                    "{}  LaTeX saved to {}",
                    green("✔"),
                    bold(&cli.tex_name.display().to_string())
                );
            }
        }
        Err(e) => {
            eprintln!("{} {}", red("✗"), e);
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
///
/// The transcript is written without `\newpage` markers or page-break
/// elements; the LaTeX stage inserts its own page structure.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .newpage_markers(false)
        .page_breaks(false);

    if let Some(ref dir) = cli.model_dir {
        builder = builder.model_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
