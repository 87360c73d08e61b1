//! OCR invocation: persist a rendered page and recognise it.
//!
//! Each page is written to a uniquely named temporary PNG and recognised
//! from that file. The handle deletes the file when it drops at the end of
//! the page, so a long document never accumulates page images on disk.
//!
//! ## Return Value
//!
//! [`recognise_page`] always returns a `PageResult`; the error never
//! propagates upward, so a single bad page doesn't abort the document.
//! Callers check `result.error` to decide whether to include or skip the
//! page.

use std::time::Instant;

use image::DynamicImage;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{OcrError, PageError};
use crate::ocr::{OcrEngine, RecognitionMode};
use crate::output::PageResult;

/// Recognise a single rendered page.
pub fn recognise_page(
    engine: &OcrEngine,
    page_num: usize,
    image: &DynamicImage,
    mode: RecognitionMode,
    max_new_tokens: usize,
) -> PageResult {
    let start = Instant::now();

    match recognise_inner(engine, image, mode, max_new_tokens) {
        Ok(text) => {
            let duration = start.elapsed();
            debug!("Page {}: {} bytes of text, {:?}", page_num, text.len(), duration);

            PageResult {
                page_num,
                text,
                duration_ms: duration.as_millis() as u64,
                error: None,
            }
        }
        Err(e) => {
            let detail = e.to_string();
            warn!("Page {}: OCR failed: {}", page_num, detail);

            PageResult {
                page_num,
                text: String::new(),
                duration_ms: start.elapsed().as_millis() as u64,
                error: Some(PageError::OcrFailed {
                    page: page_num,
                    detail,
                }),
            }
        }
    }
}

fn recognise_inner(
    engine: &OcrEngine,
    image: &DynamicImage,
    mode: RecognitionMode,
    max_new_tokens: usize,
) -> Result<String, OcrError> {
    let temp = write_temp_png(image)?;
    engine.recognize_file(temp.path(), mode, max_new_tokens)
}

/// Write the page image to a uniquely named temporary PNG.
///
/// The file is deleted when the returned handle drops.
fn write_temp_png(image: &DynamicImage) -> Result<NamedTempFile, OcrError> {
    let temp = tempfile::Builder::new()
        .prefix("pdf2tex-page-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| OcrError::Image {
            message: format!("Failed to create temp file: {}", e),
        })?;

    image
        .save_with_format(temp.path(), image::ImageFormat::Png)
        .map_err(|e| OcrError::Image {
            message: format!("Failed to write '{}': {}", temp.path().display(), e),
        })?;

    Ok(temp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn sample_image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(24, 16, Rgb([200, 10, 10])))
    }

    #[test]
    fn temp_png_is_written_and_readable() {
        let temp = write_temp_png(&sample_image()).unwrap();
        assert_eq!(
            temp.path().extension().and_then(|e| e.to_str()),
            Some("png")
        );

        let back = image::open(temp.path()).unwrap();
        assert_eq!((back.width(), back.height()), (24, 16));
    }

    #[test]
    fn temp_png_is_removed_on_drop() {
        let temp = write_temp_png(&sample_image()).unwrap();
        let path = temp.path().to_path_buf();
        assert!(path.exists());

        drop(temp);
        assert!(!path.exists());
    }
}
