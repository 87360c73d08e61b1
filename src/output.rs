//! Result types returned by the extraction stage.
//!
//! [`extract`](crate::convert::extract) reports partial success explicitly:
//! every page yields a [`PageResult`] whether it succeeded or not, and the
//! run as a whole yields an [`ExtractionOutput`] carrying the assembled
//! document, the per-page results, and aggregate [`ExtractionStats`].
//! Callers decide what a failed page means to them; the library never
//! swallows one.

use serde::{Deserialize, Serialize};

use crate::document::PageDocument;
use crate::error::PageError;

/// Outcome of processing a single page.
///
/// Exactly one of the two holds: `error.is_none()` and `text` carries the
/// recognised page text, or `error.is_some()` and `text` is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-based page number within the source PDF.
    pub page_num: usize,

    /// Recognised text for the page. Empty when the page failed.
    pub text: String,

    /// Wall-clock time spent on this page (render plus OCR), in ms.
    pub duration_ms: u64,

    /// The failure, if the page could not be rendered or recognised.
    pub error: Option<PageError>,
}

impl PageResult {
    /// True when the page produced text.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate statistics for one extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Page count of the source PDF.
    pub total_pages: usize,

    /// Pages that produced text.
    pub processed_pages: usize,

    /// Pages skipped due to a render or OCR failure.
    pub failed_pages: usize,

    /// End-to-end wall-clock time, in ms.
    pub total_duration_ms: u64,

    /// Time spent rasterising pages, summed across pages, in ms.
    pub render_duration_ms: u64,

    /// Time spent in OCR, summed across pages, in ms.
    pub ocr_duration_ms: u64,
}

/// Everything produced by one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    /// The assembled paragraph document, ready to write as `.docx`.
    pub document: PageDocument,

    /// Per-page results in page order, failed pages included.
    pub pages: Vec<PageResult>,

    /// Aggregate counters and timings.
    pub stats: ExtractionStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_result_success_flag() {
        let ok = PageResult {
            page_num: 1,
            text: "hello".into(),
            duration_ms: 12,
            error: None,
        };
        let bad = PageResult {
            page_num: 2,
            text: String::new(),
            duration_ms: 3,
            error: Some(PageError::OcrFailed {
                page: 2,
                detail: "boom".into(),
            }),
        };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }

    #[test]
    fn page_result_round_trips_through_json() {
        let pr = PageResult {
            page_num: 5,
            text: String::new(),
            duration_ms: 80,
            error: Some(PageError::RenderFailed {
                page: 5,
                detail: "bitmap".into(),
            }),
        };
        let json = serde_json::to_string(&pr).unwrap();
        let back: PageResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.page_num, 5);
        assert!(!back.is_success());
    }
}
