use std::str::FromStr;

use super::{Config, ModelSourceKind};
use crate::prompt::PromptMode;

fn env_parsed<T: FromStr>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    if let Ok(parsed) = v.trim().parse::<T>() {
        Some(parsed)
    } else {
        tracing::warn!("ignoring invalid {key} value: {v}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_model();
        self.apply_env_overrides_service();
    }

    fn apply_env_overrides_model(&mut self) {
        if let Ok(v) = std::env::var("QUIZBOT_MODEL_SOURCE") {
            match v.trim().to_ascii_lowercase().as_str() {
                "huggingface" | "hf" => self.model.source = ModelSourceKind::HuggingFace,
                "local" => self.model.source = ModelSourceKind::Local,
                _ => tracing::warn!("ignoring invalid QUIZBOT_MODEL_SOURCE value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("QUIZBOT_MODEL_REPO") {
            self.model.repo_id = v;
        }
        if let Ok(v) = std::env::var("QUIZBOT_MODEL_REVISION") {
            self.model.revision = Some(v);
        }
        if let Ok(v) = std::env::var("QUIZBOT_MODEL_PATH") {
            self.model.local_path = Some(v);
        }
        if let Ok(v) = std::env::var("QUIZBOT_DEVICE") {
            self.model.device = v;
        }
        if let Some(preload) = env_parsed::<bool>("QUIZBOT_MODEL_PRELOAD") {
            self.model.preload = preload;
        }
    }

    fn apply_env_overrides_service(&mut self) {
        if let Some(mode) = env_parsed::<PromptMode>("QUIZBOT_MODE") {
            self.generation.mode = mode;
        }
        if let Some(count) = env_parsed::<usize>("QUIZBOT_QUESTION_COUNT") {
            self.generation.question_count = count;
        }
        if let Some(seed) = env_parsed::<u64>("QUIZBOT_SEED") {
            self.generation.seed = Some(seed);
        }
        if let Some(size) = env_parsed::<u64>("QUIZBOT_MAX_FILE_SIZE") {
            self.document.max_file_size = size;
        }
        if let Ok(v) = std::env::var("QUIZBOT_TEMP_DIR") {
            self.document.temp_dir = Some(v);
        }
        if let Ok(v) = std::env::var("QUIZBOT_BIND") {
            self.server.bind = v;
        }
        if let Some(port) = env_parsed::<u16>("QUIZBOT_PORT") {
            self.server.port = port;
        }
        if let Some(limit) = env_parsed::<u32>("QUIZBOT_RATE_LIMIT") {
            self.server.rate_limit = limit;
        }
        if let Some(size) = env_parsed::<usize>("QUIZBOT_MAX_BODY_SIZE") {
            self.server.max_body_size = size;
        }
    }
}
