use serde::{Deserialize, Serialize};

use crate::pipeline::{DEFAULT_QUESTION_COUNT, QuizSettings};
use crate::prompt::PromptMode;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where model weights come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSourceKind {
    #[default]
    HuggingFace,
    Local,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub source: ModelSourceKind,
    #[serde(default = "default_repo_id")]
    pub repo_id: String,
    #[serde(default)]
    pub revision: Option<String>,
    /// Directory holding `config.json`, `tokenizer.json` and `model.safetensors`.
    #[serde(default)]
    pub local_path: Option<String>,
    #[serde(default = "default_device")]
    pub device: String,
    /// Load the weights at startup instead of on the first request.
    #[serde(default)]
    pub preload: bool,
}

fn default_repo_id() -> String {
    "valhalla/t5-base-e2e-qg".into()
}

fn default_device() -> String {
    "cpu".into()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            source: ModelSourceKind::default(),
            repo_id: default_repo_id(),
            revision: None,
            local_path: None,
            device: default_device(),
            preload: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GenerationSettings {
    #[serde(default)]
    pub mode: PromptMode,
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_question_count() -> usize {
    DEFAULT_QUESTION_COUNT
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            mode: PromptMode::default(),
            question_count: default_question_count(),
            seed: None,
        }
    }
}

impl GenerationSettings {
    #[must_use]
    pub fn quiz_settings(&self) -> QuizSettings {
        QuizSettings {
            mode: self.mode,
            question_count: self.question_count,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DocumentConfig {
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// PDF scratch directory; the system temp dir when unset.
    #[serde(default)]
    pub temp_dir: Option<String>,
}

fn default_max_file_size() -> u64 {
    quizbot_document::DEFAULT_MAX_FILE_SIZE
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            temp_dir: None,
        }
    }
}

impl DocumentConfig {
    #[must_use]
    pub fn adapter(&self) -> quizbot_document::SourceAdapter {
        let adapter = quizbot_document::SourceAdapter::new(self.max_file_size);
        match &self.temp_dir {
            Some(dir) => adapter.with_temp_dir(dir),
            None => adapter,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Requests per minute per client IP; 0 disables the limit.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_bind() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8080
}

fn default_rate_limit() -> u32 {
    60
}

fn default_max_body_size() -> usize {
    52_428_800
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            rate_limit: default_rate_limit(),
            max_body_size: default_max_body_size(),
        }
    }
}
