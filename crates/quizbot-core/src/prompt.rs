use std::fmt;
use std::str::FromStr;

use quizbot_document::SourceText;
use serde::{Deserialize, Serialize};

/// Instruction the question-generation model was fine-tuned on.
pub const QUESTION_PREFIX: &str = "generate questions: ";

/// Rotating framings for one-question-per-prompt generation; the source text
/// is appended to each.
pub const TEMPLATES: [&str; 8] = [
    "Generate a factual question about this text: ",
    "What analytical question can be asked about: ",
    "Create a specific question based on: ",
    "What detailed question relates to: ",
    "Form a comprehensive question about: ",
    "What application question can be derived from: ",
    "Generate a comparison question about: ",
    "What cause-and-effect question can be asked about: ",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// One prompt; the model writes every question into a single output.
    #[default]
    Combined,
    /// One prompt, and one question, per requested question.
    Templated,
}

impl PromptMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Combined => "combined",
            Self::Templated => "templated",
        }
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "combined" | "single" => Ok(Self::Combined),
            "templated" | "template" | "per-prompt" => Ok(Self::Templated),
            other => Err(format!("unknown prompt mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// 0-based request index; selects the template and the temperature step.
    pub index: usize,
    pub text: String,
}

/// Build the model inputs for `source`. `count` only matters in templated mode.
///
/// Does not validate `source`; blank input is rejected before this point.
#[must_use]
pub fn build_prompts(source: &SourceText, mode: PromptMode, count: usize) -> Vec<Prompt> {
    match mode {
        PromptMode::Combined => vec![Prompt {
            index: 0,
            text: format!("{QUESTION_PREFIX}{source}"),
        }],
        PromptMode::Templated => (0..count)
            .map(|index| Prompt {
                index,
                text: format!("{}{source}", TEMPLATES[index % TEMPLATES.len()]),
            })
            .collect(),
    }
}
