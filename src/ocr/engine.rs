//! The ONNX encoder/decoder OCR engine.
//!
//! [`OcrEngine`] owns two ONNX Runtime sessions (a vision encoder and a text
//! decoder), a HuggingFace tokenizer, and the model's [`ModelConfig`]. The
//! sessions sit behind mutexes so a single engine can be shared via `Arc`
//! and used from any thread, one recognition at a time.
//!
//! Decoding is greedy: the decoder is re-run on the full token prefix each
//! step and the argmax of the final position's logits becomes the next
//! token, until the end-of-sequence token or the caller's token cap.

use std::fmt;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use image::DynamicImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionInputValue};
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::preprocess;
use crate::error::OcrError;

/// Recognition task requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecognitionMode {
    /// Bare text transcription.
    Plain,
    /// Markup-preserving transcription (titles, formulas, footnotes). (default)
    #[default]
    Format,
}

impl RecognitionMode {
    /// The fixed task prompt the model was trained with.
    pub fn prompt(self) -> &'static str {
        match self {
            RecognitionMode::Plain => "OCR: ",
            RecognitionMode::Format => "OCR with format: ",
        }
    }
}

/// Model description loaded from `config.json` in the model directory.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Square edge length of the encoder input, in pixels.
    pub image_size: u32,
    /// Per-channel normalisation mean (3 entries).
    pub image_mean: Vec<f32>,
    /// Per-channel normalisation standard deviation (3 entries).
    pub image_std: Vec<f32>,
    /// Token id the decoder sequence starts with.
    pub decoder_start_token_id: u32,
    /// Token id that terminates generation.
    pub eos_token_id: u32,
}

impl ModelConfig {
    /// Load and validate a model config from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, OcrError> {
        let raw = std::fs::read_to_string(path).map_err(|e| OcrError::Config {
            message: format!("Failed to read '{}': {}", path.display(), e),
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| OcrError::Config {
            message: format!("Failed to parse '{}': {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check channel counts and value ranges.
    pub fn validate(&self) -> Result<(), OcrError> {
        if self.image_size == 0 {
            return Err(OcrError::Config {
                message: "image_size must be > 0".into(),
            });
        }
        if self.image_mean.len() != 3 || self.image_std.len() != 3 {
            return Err(OcrError::Config {
                message: format!(
                    "image_mean and image_std must have 3 entries, got {} and {}",
                    self.image_mean.len(),
                    self.image_std.len()
                ),
            });
        }
        if self.image_std.iter().any(|&s| s == 0.0) {
            return Err(OcrError::Config {
                message: "image_std entries must be non-zero".into(),
            });
        }
        Ok(())
    }
}

/// One ONNX session plus its discovered graph interface.
struct ModelSession {
    session: Mutex<Session>,
    input_names: Vec<String>,
    output_names: Vec<String>,
}

impl ModelSession {
    fn from_file(path: &Path) -> Result<Self, OcrError> {
        debug!("Loading ONNX model from: {}", path.display());

        let bytes = std::fs::read(path).map_err(|e| OcrError::ModelFile {
            message: format!("Failed to read '{}': {}", path.display(), e),
        })?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_memory(&bytes)?;

        let input_names: Vec<String> = session
            .inputs()
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();
        if input_names.is_empty() || output_names.is_empty() {
            return Err(OcrError::Graph {
                message: format!("'{}' declares no inputs or outputs", path.display()),
            });
        }

        debug!("Model inputs: {:?}", input_names);
        debug!("Model outputs: {:?}", output_names);

        Ok(Self {
            session: Mutex::new(session),
            input_names,
            output_names,
        })
    }

    /// Resolve a graph input name, exact match first, then substring.
    fn input_name(&self, wanted: &str) -> Result<String, OcrError> {
        self.input_names
            .iter()
            .find(|n| n.as_str() == wanted)
            .or_else(|| self.input_names.iter().find(|n| n.contains(wanted)))
            .cloned()
            .ok_or_else(|| OcrError::Graph {
                message: format!(
                    "no input matching '{}' (inputs: {:?})",
                    wanted, self.input_names
                ),
            })
    }

    fn output_name(&self, wanted: &str) -> String {
        self.output_names
            .iter()
            .find(|n| n.as_str() == wanted)
            .or_else(|| self.output_names.iter().find(|n| n.contains(wanted)))
            .cloned()
            .unwrap_or_else(|| self.output_names[0].clone())
    }

    /// Run the session and extract `wanted` (or the first output) as f32.
    fn run_f32(
        &self,
        inputs: Vec<(&str, SessionInputValue<'static>)>,
        wanted: &str,
    ) -> Result<(Vec<usize>, Vec<f32>), OcrError> {
        let target = self.output_name(wanted);
        let mut session = self.session.lock().map_err(|e| OcrError::Graph {
            message: format!("Failed to lock session: {}", e),
        })?;

        let outputs = session.run(inputs)?;
        for (name, value) in outputs.iter() {
            if name == target.as_str() {
                let (shape_ref, data) = value.try_extract_tensor::<f32>()?;
                let shape: Vec<usize> = shape_ref.iter().map(|&s| s as usize).collect();
                return Ok((shape, data.to_vec()));
            }
        }
        Err(OcrError::Graph {
            message: format!("output '{}' missing from run results", target),
        })
    }
}

fn f32_input(shape: Vec<i64>, data: Vec<f32>) -> Result<SessionInputValue<'static>, OcrError> {
    Ok(Tensor::from_array((shape, data))?.into())
}

fn i64_input(shape: Vec<i64>, data: Vec<i64>) -> Result<SessionInputValue<'static>, OcrError> {
    Ok(Tensor::from_array((shape, data))?.into())
}

/// Index of the maximum value. Ties resolve to the first occurrence.
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    let mut best_val = f32::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_val {
            best = i;
            best_val = v;
        }
    }
    best
}

/// A loaded OCR model: vision encoder, text decoder, tokenizer.
///
/// Construct with [`OcrEngine::from_dir`], share via `Arc`, drop to release
/// the ONNX sessions. Construction is the expensive part; one engine should
/// serve all pages of a run (and any number of runs).
pub struct OcrEngine {
    encoder: ModelSession,
    decoder: ModelSession,
    tokenizer: Tokenizer,
    config: ModelConfig,
}

impl OcrEngine {
    /// Load an engine from a model directory.
    ///
    /// Expected layout:
    /// ```text
    /// model_dir/
    /// ├── config.json      image size, normalisation, token ids
    /// ├── tokenizer.json   HuggingFace tokenizer
    /// ├── encoder.onnx     vision encoder
    /// └── decoder.onnx     text decoder
    /// ```
    pub fn from_dir(model_dir: impl AsRef<Path>) -> Result<Self, OcrError> {
        let dir = model_dir.as_ref();
        info!("Loading OCR model from {}", dir.display());
        let start = Instant::now();

        let config = ModelConfig::from_path(&dir.join("config.json"))?;
        let tokenizer_path = dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| OcrError::Tokenizer {
            message: format!("Failed to load '{}': {}", tokenizer_path.display(), e),
        })?;
        let encoder = ModelSession::from_file(&dir.join("encoder.onnx"))?;
        let decoder = ModelSession::from_file(&dir.join("decoder.onnx"))?;

        info!("OCR model ready in {}ms", start.elapsed().as_millis());
        Ok(Self {
            encoder,
            decoder,
            tokenizer,
            config,
        })
    }

    /// The model config the engine was loaded with.
    pub fn model_config(&self) -> &ModelConfig {
        &self.config
    }

    /// Recognise the text on one page image.
    ///
    /// Runs the encoder once, then greedily decodes until the model emits
    /// its end-of-sequence token or `max_new_tokens` tokens were generated.
    /// The returned text is trimmed.
    pub fn recognize(
        &self,
        image: &DynamicImage,
        mode: RecognitionMode,
        max_new_tokens: usize,
    ) -> Result<String, OcrError> {
        let start = Instant::now();

        // ── Encoder pass ──────────────────────────────────────────────────
        let pixels = preprocess::normalise(
            image,
            self.config.image_size,
            &self.config.image_mean,
            &self.config.image_std,
        );
        let pixel_shape: Vec<i64> = pixels.shape().iter().map(|&s| s as i64).collect();
        let (pixel_data, _) = pixels.into_raw_vec_and_offset();

        let pixel_name = self.encoder.input_name("pixel_values")?;
        let (hidden_shape, hidden_data) = self.encoder.run_f32(
            vec![(pixel_name.as_str(), f32_input(pixel_shape, pixel_data)?)],
            "last_hidden_state",
        )?;
        let hidden_shape: Vec<i64> = hidden_shape.iter().map(|&s| s as i64).collect();

        // ── Greedy decode ─────────────────────────────────────────────────
        let prompt_ids = self.prompt_ids(mode)?;
        let ids_name = self.decoder.input_name("input_ids")?;
        let hidden_name = self.decoder.input_name("encoder_hidden_states")?;

        let mut generated: Vec<u32> = Vec::new();
        for _ in 0..max_new_tokens {
            let mut ids: Vec<i64> = Vec::with_capacity(1 + prompt_ids.len() + generated.len());
            ids.push(self.config.decoder_start_token_id as i64);
            ids.extend(prompt_ids.iter().map(|&t| t as i64));
            ids.extend(generated.iter().map(|&t| t as i64));
            let steps = ids.len() as i64;

            let inputs = vec![
                (ids_name.as_str(), i64_input(vec![1, steps], ids)?),
                (
                    hidden_name.as_str(),
                    f32_input(hidden_shape.clone(), hidden_data.clone())?,
                ),
            ];
            let (logits_shape, logits) = self.decoder.run_f32(inputs, "logits")?;

            let vocab = *logits_shape.last().ok_or_else(|| OcrError::Graph {
                message: "decoder returned a scalar where logits were expected".into(),
            })?;
            if vocab == 0 || logits.len() < vocab {
                return Err(OcrError::Graph {
                    message: format!("logits shape {:?} is inconsistent", logits_shape),
                });
            }

            let next = argmax(&logits[logits.len() - vocab..]) as u32;
            if next == self.config.eos_token_id {
                break;
            }
            generated.push(next);
        }

        let text = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| OcrError::Tokenizer {
                message: format!("Failed to decode {} tokens: {}", generated.len(), e),
            })?;

        debug!(
            "Recognised {} tokens in {}ms",
            generated.len(),
            start.elapsed().as_millis()
        );
        Ok(text.trim().to_string())
    }

    /// Read an image file and recognise it.
    pub fn recognize_file(
        &self,
        path: impl AsRef<Path>,
        mode: RecognitionMode,
        max_new_tokens: usize,
    ) -> Result<String, OcrError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| OcrError::Image {
            message: format!("Failed to open '{}': {}", path.display(), e),
        })?;
        self.recognize(&image, mode, max_new_tokens)
    }

    fn prompt_ids(&self, mode: RecognitionMode) -> Result<Vec<u32>, OcrError> {
        let encoding =
            self.tokenizer
                .encode(mode.prompt(), false)
                .map_err(|e| OcrError::Tokenizer {
                    message: format!("Failed to encode prompt: {}", e),
                })?;
        Ok(encoding.get_ids().to_vec())
    }
}

impl fmt::Debug for OcrEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrEngine")
            .field("image_size", &self.config.image_size)
            .field("decoder_start_token_id", &self.config.decoder_start_token_id)
            .field("eos_token_id", &self.config.eos_token_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONFIG: &str = r#"{
        "image_size": 384,
        "image_mean": [0.48145466, 0.4578275, 0.40821073],
        "image_std": [0.26862954, 0.26130258, 0.27577711],
        "decoder_start_token_id": 0,
        "eos_token_id": 2
    }"#;

    #[test]
    fn argmax_picks_largest() {
        assert_eq!(argmax(&[0.1, 0.9, 0.3]), 1);
        assert_eq!(argmax(&[-5.0, -2.0, -9.0]), 1);
    }

    #[test]
    fn argmax_ties_resolve_to_first() {
        assert_eq!(argmax(&[1.0, 1.0, 0.5]), 0);
    }

    #[test]
    fn prompts_match_recognition_modes() {
        assert_eq!(RecognitionMode::Plain.prompt(), "OCR: ");
        assert_eq!(RecognitionMode::Format.prompt(), "OCR with format: ");
    }

    #[test]
    fn model_config_parses_and_validates() {
        let config: ModelConfig = serde_json::from_str(VALID_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.image_size, 384);
        assert_eq!(config.eos_token_id, 2);
    }

    #[test]
    fn model_config_rejects_short_mean() {
        let raw = r#"{
            "image_size": 384,
            "image_mean": [0.5],
            "image_std": [0.5, 0.5, 0.5],
            "decoder_start_token_id": 0,
            "eos_token_id": 2
        }"#;
        let config: ModelConfig = serde_json::from_str(raw).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn model_config_rejects_zero_std() {
        let raw = r#"{
            "image_size": 384,
            "image_mean": [0.5, 0.5, 0.5],
            "image_std": [0.5, 0.0, 0.5],
            "decoder_start_token_id": 0,
            "eos_token_id": 2
        }"#;
        let config: ModelConfig = serde_json::from_str(raw).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn model_config_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, VALID_CONFIG).unwrap();
        let config = ModelConfig::from_path(&path).unwrap();
        assert_eq!(config.image_mean.len(), 3);
    }

    #[test]
    fn missing_model_config_is_config_error() {
        let err = ModelConfig::from_path(Path::new("no-such-config.json")).unwrap_err();
        assert!(matches!(err, OcrError::Config { .. }));
    }
}
