//! Prompt building, output parsing, the quiz pipeline and configuration loading.

pub mod config;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod prompt;

pub use error::QuizError;
pub use parser::Question;
pub use pipeline::{QuizOptions, QuizPipeline, QuizResult, QuizSettings};
pub use prompt::{Prompt, PromptMode};
