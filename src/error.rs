//! Error types for the pdf2tex library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2TexError`] — **Fatal**: the stage cannot proceed at all
//!   (bad input file, unconfigured model, unwritable output). Returned as
//!   `Err(Pdf2TexError)` from the top-level `extract*` and `reformat*`
//!   functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed (render glitch,
//!   OCR fault) but all other pages are fine. Stored inside
//!   [`crate::output::PageResult`] so callers can inspect partial
//!   success rather than losing the whole document to one bad page.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! page failure, log and continue, or collect all errors for a post-run report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2tex library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2TexError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    // ── OCR engine errors ─────────────────────────────────────────────────
    /// No engine handle and no model directory were supplied.
    #[error("OCR model is not configured.\n{hint}")]
    ModelNotConfigured { hint: String },

    /// Engine construction failed (bad model directory, tokenizer, session).
    #[error("OCR engine error: {0}")]
    Ocr(#[from] OcrError),

    // ── Document errors ───────────────────────────────────────────────────
    /// Could not serialise or write the intermediate document file.
    #[error("Failed to write document file '{path}': {detail}")]
    DocumentWriteFailed { path: PathBuf, detail: String },

    /// Could not open or parse the intermediate document file.
    #[error("Failed to read document file '{path}': {detail}\nRun the extraction stage first, or check the path.")]
    DocumentReadFailed { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output LaTeX file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Install pdfium (for example from the pdfium-binaries releases) on the\n\
    system library search path.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Stored alongside [`crate::output::PageResult`] when a page fails.
/// The extraction continues with the next page; a failed page simply
/// contributes no paragraph to the document.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// OCR recognition failed.
    #[error("Page {page}: OCR failed: {detail}")]
    OcrFailed { page: usize, detail: String },
}

/// Errors raised inside the OCR engine.
///
/// Wrapped into [`Pdf2TexError::Ocr`] when engine construction fails;
/// recognition-time occurrences are flattened into
/// [`PageError::OcrFailed`] details by the page loop.
#[derive(Debug, Error)]
pub enum OcrError {
    /// Model config file is missing, unreadable, or invalid.
    #[error("Model config error: {message}")]
    Config { message: String },

    /// Tokenizer file failed to load or decode.
    #[error("Tokenizer error: {message}")]
    Tokenizer { message: String },

    /// Encoder or decoder ONNX file could not be read.
    #[error("Model file error: {message}")]
    ModelFile { message: String },

    /// ONNX runtime rejected a session, input, or run call.
    #[error("ONNX runtime error: {0}")]
    Runtime(#[from] ort::Error),

    /// Model graph shape mismatch (missing output, poisoned session lock).
    #[error("Model graph error: {message}")]
    Graph { message: String },

    /// Page image could not be decoded or encoded.
    #[error("Image error: {message}")]
    Image { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_display() {
        let e = Pdf2TexError::FileNotFound {
            path: PathBuf::from("missing.pdf"),
        };
        let msg = e.to_string();
        assert!(msg.contains("missing.pdf"), "got: {msg}");
        assert!(msg.contains("Check the path"), "got: {msg}");
    }

    #[test]
    fn model_not_configured_display() {
        let e = Pdf2TexError::ModelNotConfigured {
            hint: "Set PDF2TEX_MODEL_DIR.".into(),
        };
        assert!(e.to_string().contains("PDF2TEX_MODEL_DIR"));
    }

    #[test]
    fn page_error_render_display() {
        let e = PageError::RenderFailed {
            page: 4,
            detail: "bitmap allocation".into(),
        };
        assert!(e.to_string().contains("Page 4"));
        assert!(e.to_string().contains("bitmap allocation"));
    }

    #[test]
    fn page_error_ocr_display() {
        let e = PageError::OcrFailed {
            page: 2,
            detail: "decoder stalled".into(),
        };
        assert!(e.to_string().contains("Page 2"));
        assert!(e.to_string().contains("OCR failed"));
    }

    #[test]
    fn page_error_serialises() {
        let e = PageError::OcrFailed {
            page: 7,
            detail: "x".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: PageError = serde_json::from_str(&json).unwrap();
        assert!(back.to_string().contains("Page 7"));
    }

    #[test]
    fn ocr_error_wraps_into_fatal() {
        let e: Pdf2TexError = OcrError::Config {
            message: "image_mean must have 3 entries".into(),
        }
        .into();
        assert!(e.to_string().contains("image_mean"));
    }
}
