//! Question generation client: the request/response contract with a pretrained
//! sequence-to-sequence model, its decoding presets, and the backends behind it.

#[cfg(feature = "candle")]
pub mod candle_provider;
pub mod decode;
pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod provider;

pub use error::LlmError;
pub use provider::{DecodingStrategy, GenerationConfig, GenerationRequest, QuestionGenerator};
