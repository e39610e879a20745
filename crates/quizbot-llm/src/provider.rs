use crate::error::LlmError;

/// How tokens are picked at each decoding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodingStrategy {
    /// Single sequence, temperature + top-p sampling.
    Nucleus,
    /// Several sampled beams, best finished hypothesis wins.
    BeamSample,
}

/// Decoding parameters sent with every prompt.
///
/// Output bounds count generated tokens, not the decoder start token. The end
/// token is resolved from the loaded model and doubles as the pad token.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub max_input_tokens: usize,
    pub max_output_tokens: usize,
    pub min_output_tokens: usize,
    pub temperature: f64,
    pub top_p: Option<f64>,
    pub num_beams: usize,
    pub no_repeat_ngram_size: usize,
    pub num_return_sequences: usize,
    /// `None` draws a fresh seed per request.
    pub seed: Option<u64>,
}

impl GenerationConfig {
    /// Preset for the single combined prompt: top-p 0.80 at temperature 0.70.
    #[must_use]
    pub fn nucleus() -> Self {
        Self {
            max_input_tokens: 2048,
            max_output_tokens: 1024,
            min_output_tokens: 0,
            temperature: 0.7,
            top_p: Some(0.8),
            num_beams: 1,
            no_repeat_ngram_size: 0,
            num_return_sequences: 1,
            seed: None,
        }
    }

    /// Preset for one-question-per-prompt: six sampled beams with a trigram guard.
    ///
    /// Output bounds count generated tokens only, so a sequence including the
    /// decoder start token spans 15 to 90 tokens.
    #[must_use]
    pub fn beam_sample() -> Self {
        Self {
            max_input_tokens: 512,
            max_output_tokens: 89,
            min_output_tokens: 14,
            temperature: 0.7,
            top_p: None,
            num_beams: 6,
            no_repeat_ngram_size: 3,
            num_return_sequences: 1,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn strategy(&self) -> DecodingStrategy {
        if self.num_beams > 1 {
            DecodingStrategy::BeamSample
        } else {
            DecodingStrategy::Nucleus
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::nucleus()
    }
}

/// One prompt plus the decoding parameters it is generated with.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub config: GenerationConfig,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(prompt: impl Into<String>, config: GenerationConfig) -> Self {
        Self {
            prompt: prompt.into(),
            config,
        }
    }
}

pub trait QuestionGenerator: Send + Sync {
    /// Run the model on one prompt and return the decoded text.
    ///
    /// Sampling is stochastic: identical requests may return different text
    /// unless the request carries a seed.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded or the forward pass fails.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nucleus_preset() {
        let config = GenerationConfig::nucleus();
        assert_eq!(config.max_input_tokens, 2048);
        assert_eq!(config.max_output_tokens, 1024);
        assert!((config.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.top_p, Some(0.8));
        assert_eq!(config.num_return_sequences, 1);
        assert_eq!(config.strategy(), DecodingStrategy::Nucleus);
    }

    #[test]
    fn beam_sample_preset() {
        let config = GenerationConfig::beam_sample();
        assert_eq!(config.max_input_tokens, 512);
        // 15..=90 once the decoder start token is counted
        assert_eq!(config.max_output_tokens, 89);
        assert_eq!(config.min_output_tokens, 14);
        assert_eq!(config.num_beams, 6);
        assert_eq!(config.no_repeat_ngram_size, 3);
        assert_eq!(config.strategy(), DecodingStrategy::BeamSample);
    }

    #[test]
    fn default_is_nucleus() {
        assert_eq!(GenerationConfig::default(), GenerationConfig::nucleus());
    }

    #[test]
    fn builder_overrides() {
        let config = GenerationConfig::beam_sample()
            .with_temperature(0.85)
            .with_seed(Some(7));
        assert!((config.temperature - 0.85).abs() < f64::EPSILON);
        assert_eq!(config.seed, Some(7));
    }
}
