mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!("no config file at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject settings the service cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.generation.question_count == 0 {
            bail!("generation.question_count must be at least 1");
        }
        if self.server.port == 0 {
            bail!("server.port must not be 0");
        }
        if self.server.max_body_size == 0 {
            bail!("server.max_body_size must not be 0");
        }
        match self.model.source {
            ModelSourceKind::HuggingFace if self.model.repo_id.trim().is_empty() => {
                bail!("model.repo_id is required for the huggingface source");
            }
            ModelSourceKind::Local
                if self.model.local_path.as_deref().is_none_or(|p| p.trim().is_empty()) =>
            {
                bail!("model.local_path is required for the local source");
            }
            _ => {}
        }
        Ok(())
    }
}
