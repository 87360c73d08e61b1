//! # pdf2tex
//!
//! Convert PDF documents to LaTeX with a local ONNX OCR model.
//!
//! ## Why this crate?
//!
//! Traditional PDF-to-text tools (pdftotext, pdf-extract) fail on scanned
//! documents and complex layouts — formulas, footnotes, and multi-line titles
//! come out garbled or not at all. Instead this crate rasterises each page
//! into an image and reads it with a local image-to-text model, producing
//! markup that survives the trip into a LaTeX article. No network access and
//! no API key: the model runs on your machine through ONNX Runtime.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve the local file path
//!  ├─ 2. Render    rasterise pages via pdfium (2048 px wide)
//!  ├─ 3. OCR       encoder/decoder ONNX model, greedy decoding
//!  ├─ 4. Document  accumulate page texts into a .docx model
//!  └─ 5. Reformat  rewrite the paragraphs as a LaTeX article (.tex)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2tex::{extract, reformat_to_file, ExtractionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Model directory taken from PDF2TEX_MODEL_DIR when not set here
//!     let config = ExtractionConfig::builder()
//!         .model_dir("models/got-ocr2")
//!         .build()?;
//!     let output = extract("document.pdf", &config)?;
//!     output.document.write_docx("doc_output.docx")?;
//!     reformat_to_file("doc_output.docx", "tex_output.tex")?;
//!     eprintln!(
//!         "pages: {} ok / {} failed",
//!         output.stats.processed_pages, output.stats.failed_pages
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2tex` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2tex = { version = "0.3", default-features = false }
//! ```
//!
//! ## Model Directory
//!
//! The OCR engine loads four files from a single directory:
//!
//! | File | Contents |
//! |------|----------|
//! | `config.json`    | image size, normalisation constants, special token ids |
//! | `tokenizer.json` | tokenizer definition |
//! | `encoder.onnx`   | vision encoder graph |
//! | `decoder.onnx`   | autoregressive text decoder graph |
//!
//! Rendering additionally needs the pdfium shared library on the system (or
//! pointed to by `PDFIUM_LIB_PATH`).

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use convert::{extract, extract_from_bytes, extract_to_file, reformat_to_file};
pub use document::{DocElement, PageDocument};
pub use error::{PageError, Pdf2TexError};
pub use ocr::{ModelConfig, OcrEngine, RecognitionMode};
pub use output::{ExtractionOutput, ExtractionStats, PageResult};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
