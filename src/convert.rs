//! Full-document extraction entry points.
//!
//! The functions here drive the whole pipeline and return only when every
//! page has been processed. [`extract`] collects every [`PageResult`] into
//! memory and assembles the document model before returning;
//! [`extract_to_file`] and [`reformat_to_file`] wrap the two on-disk output
//! formats around it.

use crate::config::ExtractionConfig;
use crate::document::{read_paragraph_texts, PageDocument};
use crate::error::Pdf2TexError;
use crate::ocr::OcrEngine;
use crate::output::{ExtractionOutput, ExtractionStats, PageResult};
use crate::pipeline::{input, ocr, reformat, render};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Extract a PDF file to the in-memory document model.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_path` — Local file path to a PDF
/// * `config` — Extraction configuration
///
/// # Returns
/// `Ok(ExtractionOutput)` on success, even if some pages failed
/// (check `output.stats.failed_pages`).
///
/// # Errors
/// Returns `Err(Pdf2TexError)` only for fatal errors:
/// - File not found / permission denied
/// - No OCR model configured, or the model failed to load
/// - Pdfium missing, or the file is not a valid PDF
pub fn extract(
    input_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2TexError> {
    let total_start = Instant::now();
    let input_path = input_path.as_ref();
    info!("Starting extraction: {}", input_path.display());

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let pdf_path = input::resolve_pdf_path(input_path)?;

    // ── Step 2: Resolve the OCR engine ───────────────────────────────────
    let engine = resolve_engine(config)?;

    // ── Step 3: Bind pdfium and open the document ────────────────────────
    let pdfium = render::bind_pdfium()?;
    let document = render::load_document(&pdfium, &pdf_path)?;
    let pages = document.pages();
    let total_pages = pages.len() as usize;

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(total_pages);
    }

    // ── Step 4: Render and recognise, one page at a time ─────────────────
    // Strictly sequential: the whole document shares one engine, and page
    // order in the output must match page order in the PDF.
    let mut results: Vec<PageResult> = Vec::with_capacity(total_pages);
    let mut render_duration_ms = 0u64;
    let mut ocr_duration_ms = 0u64;

    for index in 0..total_pages {
        let page_num = index + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total_pages);
        }

        let render_start = Instant::now();
        let rendered = render::rasterise_page(&pages, index);
        let render_elapsed = render_start.elapsed().as_millis() as u64;
        render_duration_ms += render_elapsed;

        let image = match rendered {
            Ok(image) => image,
            Err(e) => {
                warn!("Page {}: {}", page_num, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_num, total_pages, &e.to_string());
                }
                results.push(PageResult {
                    page_num,
                    text: String::new(),
                    duration_ms: render_elapsed,
                    error: Some(e),
                });
                continue;
            }
        };

        let ocr_start = Instant::now();
        let mut result =
            ocr::recognise_page(&engine, page_num, &image, config.mode, config.max_new_tokens);
        ocr_duration_ms += ocr_start.elapsed().as_millis() as u64;
        result.duration_ms += render_elapsed;

        if result.error.is_none() {
            info!("OCR of page {} done", page_num);
        }

        if let Some(ref cb) = config.progress_callback {
            match &result.error {
                None => cb.on_page_complete(page_num, total_pages, result.text.len()),
                Some(e) => cb.on_page_error(page_num, total_pages, &e.to_string()),
            }
        }

        results.push(result);
    }

    // ── Step 5: Assemble the document model ──────────────────────────────
    let assembled = assemble_document(&results, config);

    // ── Step 6: Compute stats ────────────────────────────────────────────
    let processed = results.iter().filter(|p| p.error.is_none()).count();
    let failed = results.len() - processed;

    let stats = ExtractionStats {
        total_pages,
        processed_pages: processed,
        failed_pages: failed,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
        ocr_duration_ms,
    };

    info!(
        "Extraction complete: {}/{} pages, {}ms total",
        processed, total_pages, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(total_pages, processed);
    }

    Ok(ExtractionOutput {
        document: assembled,
        pages: results,
        stats,
    })
}

/// Extract a PDF and write the document model to a `.docx` file.
///
/// Creates parent directories as needed. Returns the run statistics; the
/// extracted text lives in the written file.
pub fn extract_to_file(
    input_path: impl AsRef<Path>,
    docx_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, Pdf2TexError> {
    let output = extract(input_path, config)?;
    let path = docx_path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Pdf2TexError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    output.document.write_docx(path)?;
    info!("Text output saved to {}", path.display());
    Ok(output.stats)
}

/// Extract PDF bytes held in memory.
///
/// Writes `bytes` to a managed [`tempfile`] and extracts from there; the
/// file is removed when the call returns. Recommended when the PDF comes
/// from a database or network stream rather than a file on disk.
pub fn extract_from_bytes(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2TexError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("pdf2tex-input-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| Pdf2TexError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Pdf2TexError::Internal(format!("tempfile write: {e}")))?;
    // `tmp` is dropped (and the file deleted) when `extract` returns
    extract(tmp.path(), config)
}

/// Rewrite an extracted `.docx` into a LaTeX `.tex` file.
///
/// Reads the paragraph texts back from `docx_path`, applies the reformat
/// rules, and writes the result atomically (temp file + rename) so a failed
/// run never leaves a partial `.tex` behind.
pub fn reformat_to_file(
    docx_path: impl AsRef<Path>,
    tex_path: impl AsRef<Path>,
) -> Result<(), Pdf2TexError> {
    let paragraphs = read_paragraph_texts(docx_path.as_ref())?;
    let latex = reformat::paragraphs_to_latex(&paragraphs);

    let path = tex_path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Pdf2TexError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let tmp_path = path.with_extension("tex.tmp");
    std::fs::write(&tmp_path, &latex).map_err(|e| Pdf2TexError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|e| Pdf2TexError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!("LaTeX output saved to {}", path.display());
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the OCR engine, from most-specific to least-specific.
///
/// The three-level fallback chain lets library users and CLI users each set
/// exactly as much or as little as they need:
///
/// 1. **Pre-built engine** (`config.engine`) — the caller loaded the model
///    already; we share it as-is. Useful in tests or when extracting many
///    documents without paying the model-load cost per call.
///
/// 2. **Model directory** (`config.model_dir`) — the caller named a
///    directory holding `config.json`, `tokenizer.json`, `encoder.onnx` and
///    `decoder.onnx`; a fresh engine is loaded from it.
///
/// 3. **Environment** (`PDF2TEX_MODEL_DIR`) — the directory was chosen at
///    the execution environment level (Makefile, shell script, CI).
fn resolve_engine(config: &ExtractionConfig) -> Result<Arc<OcrEngine>, Pdf2TexError> {
    // 1) User-provided engine takes priority
    if let Some(ref engine) = config.engine {
        return Ok(Arc::clone(engine));
    }

    // 2) Explicit model directory
    if let Some(ref dir) = config.model_dir {
        return Ok(Arc::new(OcrEngine::from_dir(dir)?));
    }

    // 3) Environment fallback
    if let Ok(dir) = std::env::var("PDF2TEX_MODEL_DIR") {
        if !dir.is_empty() {
            return Ok(Arc::new(OcrEngine::from_dir(Path::new(&dir))?));
        }
    }

    Err(Pdf2TexError::ModelNotConfigured {
        hint: "Set `model_dir` in the extraction config or export PDF2TEX_MODEL_DIR \
               to a directory containing config.json, tokenizer.json, encoder.onnx \
               and decoder.onnx."
            .to_string(),
    })
}

/// Assemble the in-memory document model from successful page results.
///
/// Page texts are appended in page order; failed pages contribute nothing.
/// With `newpage_markers`, a literal `\newpage` paragraph follows each
/// page's text. With `page_breaks`, a hard break separates consecutive
/// pages (never after the last).
fn assemble_document(pages: &[PageResult], config: &ExtractionConfig) -> PageDocument {
    let successful: Vec<&PageResult> = pages.iter().filter(|p| p.error.is_none()).collect();
    let last = successful.len();
    let mut doc = PageDocument::new();

    for (i, page) in successful.iter().enumerate() {
        doc.push_text(page.text.clone());
        if config.newpage_markers {
            doc.push_text("\\newpage");
        }
        if config.page_breaks && i + 1 < last {
            doc.push_page_break();
        }
    }
    doc
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocElement;
    use crate::error::PageError;

    fn ok_page(page_num: usize, text: &str) -> PageResult {
        PageResult {
            page_num,
            text: text.to_string(),
            duration_ms: 0,
            error: None,
        }
    }

    fn failed_page(page_num: usize) -> PageResult {
        PageResult {
            page_num,
            text: String::new(),
            duration_ms: 0,
            error: Some(PageError::OcrFailed {
                page: page_num,
                detail: "boom".to_string(),
            }),
        }
    }

    #[test]
    fn test_assemble_with_markers_and_breaks() {
        let config = ExtractionConfig::default();
        let doc = assemble_document(&[ok_page(1, "one"), ok_page(2, "two")], &config);
        assert_eq!(
            doc.elements(),
            &[
                DocElement::Text("one".to_string()),
                DocElement::Text("\\newpage".to_string()),
                DocElement::PageBreak,
                DocElement::Text("two".to_string()),
                DocElement::Text("\\newpage".to_string()),
            ]
        );
    }

    #[test]
    fn test_assemble_plain_concatenation() {
        let config = ExtractionConfig::builder()
            .newpage_markers(false)
            .page_breaks(false)
            .build()
            .unwrap();
        let doc = assemble_document(&[ok_page(1, "one"), ok_page(2, "two")], &config);
        assert_eq!(
            doc.elements(),
            &[
                DocElement::Text("one".to_string()),
                DocElement::Text("two".to_string()),
            ]
        );
    }

    #[test]
    fn test_assemble_skips_failed_pages() {
        let config = ExtractionConfig::default();
        let doc = assemble_document(&[ok_page(1, "one"), failed_page(2)], &config);
        // Only one successful page, so no break is emitted after it.
        assert_eq!(
            doc.elements(),
            &[
                DocElement::Text("one".to_string()),
                DocElement::Text("\\newpage".to_string()),
            ]
        );
    }

    #[test]
    fn test_extract_missing_file_fails_before_engine_lookup() {
        let config = ExtractionConfig::default();
        let err = extract("/definitely/not/here.pdf", &config).unwrap_err();
        assert!(matches!(err, Pdf2TexError::FileNotFound { .. }), "{err}");
    }
}
