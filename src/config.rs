//! Configuration types for PDF text extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`] or taken from
//! [`ExtractionConfig::default()`]. The engine is resolved in precedence
//! order: a pre-built [`OcrEngine`] handle, then `model_dir`, then the
//! `PDF2TEX_MODEL_DIR` environment variable.

use crate::error::Pdf2TexError;
use crate::ocr::{OcrEngine, RecognitionMode};
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a PDF extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2tex::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model_dir("models/ocr-base")
///     .newpage_markers(false)
///     .page_breaks(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Pre-constructed OCR engine handle. Takes precedence over `model_dir`.
    ///
    /// Constructing an [`OcrEngine`] loads two ONNX sessions and a tokenizer,
    /// which can take seconds. Callers processing several PDFs should build
    /// the engine once and share it here via `Arc`.
    pub engine: Option<Arc<OcrEngine>>,

    /// Directory holding `config.json`, `tokenizer.json`, `encoder.onnx`,
    /// and `decoder.onnx`. Used when no `engine` is supplied; the
    /// `PDF2TEX_MODEL_DIR` environment variable is the final fallback.
    pub model_dir: Option<PathBuf>,

    /// Recognition mode passed to the engine for every page. Default: [`RecognitionMode::Format`].
    ///
    /// `Format` asks the model to preserve markup constructs (titles,
    /// formulas, footnotes) in its transcription, which is what the
    /// downstream LaTeX reformatter expects. `Plain` yields bare text.
    pub mode: RecognitionMode,

    /// Append a literal `\newpage` marker paragraph after each page's text. Default: true.
    ///
    /// The LaTeX reformatter folds these markers into page breaks. Disable
    /// when the intermediate document is the final artifact.
    pub newpage_markers: bool,

    /// Insert a page-break element after each page except the last. Default: true.
    ///
    /// Presentational only: break elements read back as empty paragraphs and
    /// never carry text.
    pub page_breaks: bool,

    /// Cap on tokens the decoder may generate per page. Default: 1536.
    ///
    /// Dense pages (tables, formula blocks) can run long; the cap bounds
    /// worst-case decode time. Generation normally stops at the model's
    /// end-of-sequence token well before the cap.
    pub max_new_tokens: usize,

    /// Optional observer receiving per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            engine: None,
            model_dir: None,
            mode: RecognitionMode::Format,
            newpage_markers: true,
            page_breaks: true,
            max_new_tokens: 1536,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("engine", &self.engine.as_ref().map(|_| "<OcrEngine>"))
            .field("model_dir", &self.model_dir)
            .field("mode", &self.mode)
            .field("newpage_markers", &self.newpage_markers)
            .field("page_breaks", &self.page_breaks)
            .field("max_new_tokens", &self.max_new_tokens)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn engine(mut self, engine: Arc<OcrEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.model_dir = Some(dir.into());
        self
    }

    pub fn mode(mut self, mode: RecognitionMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn newpage_markers(mut self, v: bool) -> Self {
        self.config.newpage_markers = v;
        self
    }

    pub fn page_breaks(mut self, v: bool) -> Self {
        self.config.page_breaks = v;
        self
    }

    pub fn max_new_tokens(mut self, n: usize) -> Self {
        self.config.max_new_tokens = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Pdf2TexError> {
        let c = &self.config;
        if c.max_new_tokens == 0 {
            return Err(Pdf2TexError::InvalidConfig(
                "max_new_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_builds() {
        let config = ExtractionConfig::builder().build().unwrap();
        assert!(config.newpage_markers);
        assert!(config.page_breaks);
        assert_eq!(config.max_new_tokens, 1536);
    }

    #[test]
    fn zero_token_cap_is_clamped_by_setter() {
        let config = ExtractionConfig::builder().max_new_tokens(0).build().unwrap();
        assert_eq!(config.max_new_tokens, 1);
    }

    #[test]
    fn zero_token_cap_rejected_by_build() {
        let mut config = ExtractionConfig::default();
        config.max_new_tokens = 0;
        let err = ExtractionConfigBuilder { config }.build();
        assert!(err.is_err());
    }
}
