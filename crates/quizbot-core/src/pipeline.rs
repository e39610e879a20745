use quizbot_document::{SourceAdapter, SourceText, TextSource};
use quizbot_llm::{GenerationConfig, GenerationRequest, QuestionGenerator};
use serde::Serialize;

use crate::error::QuizError;
use crate::parser::{Question, parse_combined, parse_templated};
use crate::prompt::{PromptMode, build_prompts};

/// Requested question counts are clamped into `1..=MAX_QUESTION_COUNT`.
pub const MAX_QUESTION_COUNT: usize = 32;
pub const DEFAULT_QUESTION_COUNT: usize = 8;

/// Added to the templated preset's temperature for each successive prompt.
pub const TEMPERATURE_STEP: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuizSettings {
    pub mode: PromptMode,
    pub question_count: usize,
    pub seed: Option<u64>,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            mode: PromptMode::Combined,
            question_count: DEFAULT_QUESTION_COUNT,
            seed: None,
        }
    }
}

impl QuizSettings {
    /// Decoding parameters for prompt `index` in `mode`.
    ///
    /// Combined prompts use the long nucleus preset. Templated prompts use the
    /// short beam-sample preset, slightly hotter per index so the framings do
    /// not collapse onto the same question. A fixed seed is offset by the index.
    #[must_use]
    pub fn generation_config(&self, mode: PromptMode, index: usize) -> GenerationConfig {
        match mode {
            PromptMode::Combined => GenerationConfig::nucleus().with_seed(self.seed),
            PromptMode::Templated => {
                let base = GenerationConfig::beam_sample();
                #[allow(clippy::cast_precision_loss)]
                let temperature = base.temperature + TEMPERATURE_STEP * index as f64;
                base.with_temperature(temperature)
                    .with_seed(self.seed.map(|s| s.wrapping_add(index as u64)))
            }
        }
    }
}

/// Per-request overrides of [`QuizSettings`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuizOptions {
    pub count: Option<usize>,
    pub mode: Option<PromptMode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizResult {
    pub mode: PromptMode,
    pub questions: Vec<Question>,
}

#[must_use]
pub fn clamp_count(count: usize) -> usize {
    count.clamp(1, MAX_QUESTION_COUNT)
}

/// Source text in, numbered questions out.
pub struct QuizPipeline<G> {
    generator: G,
    adapter: SourceAdapter,
    settings: QuizSettings,
}

impl<G: QuestionGenerator> QuizPipeline<G> {
    #[must_use]
    pub fn new(generator: G, settings: QuizSettings) -> Self {
        Self {
            generator,
            adapter: SourceAdapter::default(),
            settings,
        }
    }

    #[must_use]
    pub fn with_adapter(mut self, adapter: SourceAdapter) -> Self {
        self.adapter = adapter;
        self
    }

    #[must_use]
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Extract text from an upload or raw input, then generate questions.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::UnsupportedFormat`], [`QuizError::FileTooLarge`] or
    /// [`QuizError::Extraction`] when the source cannot be read, otherwise
    /// whatever [`Self::generate`] returns.
    pub async fn generate_from(
        &self,
        source: TextSource,
        options: QuizOptions,
    ) -> Result<QuizResult, QuizError> {
        let text = self.adapter.extract(source).await?;
        self.generate(&text, options).await
    }

    /// Generate questions for already extracted text.
    ///
    /// Prompts run one after another; the first failure aborts the request
    /// and no partial result is returned.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::EmptyInput`] for blank text, before the generator
    /// is called, and [`QuizError::Generation`] if any model call fails.
    pub async fn generate(
        &self,
        source: &SourceText,
        options: QuizOptions,
    ) -> Result<QuizResult, QuizError> {
        if source.is_blank() {
            return Err(QuizError::EmptyInput);
        }

        let mode = options.mode.unwrap_or(self.settings.mode);
        let count = clamp_count(options.count.unwrap_or(self.settings.question_count));
        let prompts = build_prompts(source, mode, count);

        let mut outputs = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            let config = self.settings.generation_config(mode, prompt.index);
            let request = GenerationRequest::new(prompt.text, config);
            let raw = self.generator.generate(&request).await.map_err(|e| {
                tracing::error!(index = prompt.index, "generation failed: {e}");
                QuizError::Generation(e)
            })?;
            tracing::debug!(index = prompt.index, "raw output: {raw}");
            outputs.push(raw);
        }

        let questions = match mode {
            PromptMode::Combined => parse_combined(&outputs.join("\n")),
            PromptMode::Templated => parse_templated(&outputs),
        };

        if questions.is_empty() {
            tracing::warn!(%mode, "model produced no questions");
        } else {
            tracing::info!(
                %mode,
                generator = self.generator.name(),
                input_chars = source.len(),
                "generated {} question(s)",
                questions.len()
            );
        }

        Ok(QuizResult { mode, questions })
    }
}
