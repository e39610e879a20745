pub mod generate;
pub mod loader;

use std::sync::{Arc, Mutex};

pub use candle_core::Device;

use candle_transformers::models::t5::T5ForConditionalGeneration;
use tokenizers::Tokenizer;
use tokio::sync::OnceCell;

use crate::error::LlmError;
use crate::provider::{GenerationRequest, QuestionGenerator};

use self::generate::{GenerationOutput, SpecialTokens, generate_t5};
use self::loader::{LoadedModel, ModelSource, load_t5_model};

struct SharedModel {
    // one request at a time; concurrent callers queue here
    model: Mutex<T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    special: SpecialTokens,
    device: Device,
}

impl SharedModel {
    fn new(loaded: LoadedModel, device: Device) -> Self {
        let LoadedModel {
            model,
            tokenizer,
            eos_token_id,
            decoder_start_token_id,
        } = loaded;
        Self {
            model: Mutex::new(model),
            tokenizer,
            special: SpecialTokens {
                eos: eos_token_id,
                decoder_start: decoder_start_token_id,
            },
            device,
        }
    }

    fn generate_sync(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let mut model = self.model.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("model lock poisoned by an earlier panic, reusing model");
            poisoned.into_inner()
        });

        let GenerationOutput {
            text,
            tokens_generated,
        } = generate_t5(
            &mut model,
            &self.tokenizer,
            &request.prompt,
            &request.config,
            self.special,
            &self.device,
        )?;

        tracing::debug!("generated {tokens_generated} token(s)");
        Ok(text)
    }
}

/// T5 question generator backed by candle.
///
/// Weights are fetched and loaded on first use and then shared by every clone
/// for the rest of the process. A failed load leaves nothing cached, so the
/// next request tries again.
#[derive(Clone)]
pub struct CandleGenerator {
    source: ModelSource,
    device: Device,
    model: Arc<OnceCell<Arc<SharedModel>>>,
}

impl std::fmt::Debug for CandleGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandleGenerator")
            .field("source", &self.source)
            .field("device", &format!("{:?}", self.device))
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl CandleGenerator {
    #[must_use]
    pub fn new(source: ModelSource, device: Device) -> Self {
        Self {
            source,
            device,
            model: Arc::new(OnceCell::new()),
        }
    }

    #[must_use]
    pub fn device_name(&self) -> &'static str {
        match &self.device {
            Device::Cpu => "cpu",
            Device::Cuda(_) => "cuda",
            Device::Metal(_) => "metal",
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// Load the model now instead of on the first request.
    ///
    /// # Errors
    ///
    /// Returns an error if model download or loading fails.
    pub async fn preload(&self) -> Result<(), LlmError> {
        self.shared_model().await.map(|_| ())
    }

    async fn shared_model(&self) -> Result<Arc<SharedModel>, LlmError> {
        self.model
            .get_or_try_init(|| async {
                let source = self.source.clone();
                let device = self.device.clone();
                tracing::info!("loading T5 model from {source} on {}", self.device_name());
                let loaded = tokio::task::spawn_blocking(move || {
                    load_t5_model(&source, &device).map(|m| SharedModel::new(m, device))
                })
                .await
                .map_err(|e| LlmError::ModelLoad(format!("model load task failed: {e}")))??;
                tracing::info!("T5 model ready");
                Ok(Arc::new(loaded))
            })
            .await
            .cloned()
    }
}

impl QuestionGenerator for CandleGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let model = self.shared_model().await?;
        let request = request.clone();
        tokio::task::spawn_blocking(move || model.generate_sync(&request))
            .await
            .map_err(|e| LlmError::Inference(format!("candle generation task failed: {e}")))?
    }

    fn name(&self) -> &str {
        "candle"
    }
}
