//! PDF rasterisation: render pages to `DynamicImage` via pdfium.
//!
//! ## Why a fixed pixel target, not DPI?
//!
//! Page sizes vary wildly: an A0 poster at 150 DPI would produce a
//! 12,000 × 17,000 px image. Capping the longest edge keeps memory bounded
//! for any page geometry, and the OCR encoder resizes to its square model
//! input anyway, so pixel density beyond the target adds nothing.

use crate::error::{PageError, Pdf2TexError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Longest-edge target for rasterised pages, in pixels.
pub const RENDER_TARGET_PX: u32 = 2048;

/// Bind to the pdfium native library.
///
/// `PDFIUM_LIB_PATH` names an explicit library file; otherwise the system
/// library search path is used.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2TexError> {
    let bindings = match std::env::var_os("PDFIUM_LIB_PATH") {
        Some(lib_path) => Pdfium::bind_to_library(Path::new(&lib_path)),
        None => Pdfium::bind_to_system_library(),
    };
    bindings
        .map(Pdfium::new)
        .map_err(|e| Pdf2TexError::PdfiumBindingFailed(e.to_string()))
}

/// Load a PDF document, mapping parse failures to [`Pdf2TexError::CorruptPdf`].
pub fn load_document<'a>(
    pdfium: &'a Pdfium,
    path: &Path,
) -> Result<PdfDocument<'a>, Pdf2TexError> {
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| Pdf2TexError::CorruptPdf {
            path: path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    info!("PDF loaded: {} pages", document.pages().len());
    Ok(document)
}

/// Render one page (0-indexed) to an image at the fixed pixel target.
///
/// Failures are per-page: the caller records the [`PageError`] and moves on
/// to the next page.
pub fn rasterise_page(pages: &PdfPages<'_>, index: usize) -> Result<DynamicImage, PageError> {
    let render_config = PdfRenderConfig::new()
        .set_target_width(RENDER_TARGET_PX as i32)
        .set_maximum_height(RENDER_TARGET_PX as i32);

    let page = pages
        .get(index as u16)
        .map_err(|e| PageError::RenderFailed {
            page: index + 1,
            detail: format!("{:?}", e),
        })?;

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| PageError::RenderFailed {
            page: index + 1,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        index + 1,
        image.width(),
        image.height()
    );

    Ok(image)
}
