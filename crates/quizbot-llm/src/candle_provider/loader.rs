use std::fmt;
use std::path::{Path, PathBuf};

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::t5::{Config as T5Config, T5ForConditionalGeneration};
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;

use crate::error::LlmError;

#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Directory holding `config.json`, `tokenizer.json` and `model.safetensors`.
    Local { path: PathBuf },
    HuggingFace {
        repo_id: String,
        revision: Option<String>,
    },
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { path } => write!(f, "{}", path.display()),
            Self::HuggingFace { repo_id, revision } => match revision {
                Some(rev) => write!(f, "hf:{repo_id}@{rev}"),
                None => write!(f, "hf:{repo_id}"),
            },
        }
    }
}

struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

/// A T5 model with the tokenizer and special tokens it was trained with.
pub struct LoadedModel {
    pub model: T5ForConditionalGeneration,
    pub tokenizer: Tokenizer,
    pub eos_token_id: u32,
    pub decoder_start_token_id: u32,
}

/// Load a T5 encoder-decoder checkpoint from the specified source.
///
/// # Errors
///
/// Returns an error if a file cannot be fetched or read, or the weights do not
/// match the configuration.
pub fn load_t5_model(source: &ModelSource, device: &Device) -> Result<LoadedModel, LlmError> {
    let files = resolve_files(source)?;

    let config_str = std::fs::read_to_string(&files.config)
        .map_err(|e| LlmError::ModelLoad(format!("failed to read T5 config: {e}")))?;
    let config: T5Config = serde_json::from_str(&config_str)?;

    let tokenizer = load_tokenizer(&files.tokenizer)?;
    let eos_token_id = token_id(config.eos_token_id)?;
    let decoder_start_token_id =
        token_id(config.decoder_start_token_id.unwrap_or(config.pad_token_id))?;

    // SAFETY: the safetensors file is not modified during the VarBuilder lifetime
    let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[files.weights], DType::F32, device)? };
    let model = T5ForConditionalGeneration::load(vb, &config)?;

    Ok(LoadedModel {
        model,
        tokenizer,
        eos_token_id,
        decoder_start_token_id,
    })
}

fn resolve_files(source: &ModelSource) -> Result<ModelFiles, LlmError> {
    match source {
        ModelSource::Local { path } => {
            let files = ModelFiles {
                config: path.join("config.json"),
                tokenizer: path.join("tokenizer.json"),
                weights: path.join("model.safetensors"),
            };
            for file in [&files.config, &files.tokenizer, &files.weights] {
                if !file.is_file() {
                    return Err(LlmError::ModelLoad(format!(
                        "missing model file: {}",
                        file.display()
                    )));
                }
            }
            Ok(files)
        }
        ModelSource::HuggingFace { repo_id, revision } => {
            let api = hf_hub::api::sync::Api::new().map_err(|e| {
                LlmError::ModelLoad(format!("failed to create HuggingFace API client: {e}"))
            })?;
            let repo = match revision {
                Some(rev) => Repo::with_revision(repo_id.clone(), RepoType::Model, rev.clone()),
                None => Repo::model(repo_id.clone()),
            };
            let repo = api.repo(repo);

            let fetch = |name: &str| {
                repo.get(name).map_err(|e| {
                    LlmError::ModelLoad(format!("failed to download {name} from {repo_id}: {e}"))
                })
            };
            Ok(ModelFiles {
                config: fetch("config.json")?,
                tokenizer: fetch("tokenizer.json")?,
                weights: fetch("model.safetensors")?,
            })
        }
    }
}

fn load_tokenizer(path: &Path) -> Result<Tokenizer, LlmError> {
    Tokenizer::from_file(path).map_err(|e| {
        LlmError::ModelLoad(format!(
            "failed to load tokenizer from {}: {e}",
            path.display()
        ))
    })
}

fn token_id(id: usize) -> Result<u32, LlmError> {
    u32::try_from(id).map_err(|e| LlmError::ModelLoad(format!("token id {id} out of range: {e}")))
}
