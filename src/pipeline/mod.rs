//! Pipeline stages for PDF-to-LaTeX conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch rendering backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ ocr ──▶ reformat
//! (path)    (pdfium)  (ONNX)  (LaTeX rules)
//! ```
//!
//! 1. [`input`]  — canonicalise the user-supplied path to an absolute file
//! 2. [`render`] — rasterise each page to a fixed-width bitmap via pdfium
//! 3. [`ocr`]    — recognise each page image with the local ONNX model; the
//!    only stage that touches the model runtime
//! 4. [`reformat`] — deterministic rewrite rules turning extracted
//!    paragraphs into a LaTeX article (titles, authors, footnotes, breaks)
//!
//! Stages run strictly in sequence; pages are processed one at a time in
//! document order.

pub mod input;
pub mod ocr;
pub mod reformat;
pub mod render;
