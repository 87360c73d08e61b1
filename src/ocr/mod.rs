//! The OCR engine: a local ONNX encoder/decoder model behind an explicit
//! resource handle.
//!
//! ## Data Flow
//!
//! ```text
//! image ──▶ preprocess ──▶ encoder ──▶ greedy decode ──▶ text
//!           (normalise)    (vision)    (decoder+argmax)  (tokenizer)
//! ```
//!
//! 1. [`preprocess`] — resize to the model's square input and normalise to
//!    an NCHW float tensor
//! 2. [`engine`]     — run the encoder once per image, then autoregressively
//!    decode with the text decoder until end-of-sequence
//!
//! The engine is constructed with [`OcrEngine::from_dir`] and dropped like
//! any other value; nothing lives at module scope.

pub mod engine;
pub mod preprocess;

pub use engine::{ModelConfig, OcrEngine, RecognitionMode};
