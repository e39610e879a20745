use quizbot_document::DocumentError;
use quizbot_llm::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("unsupported format: {0} (only .txt and .pdf are accepted)")]
    UnsupportedFormat(String),

    #[error("file too large: {0} bytes")]
    FileTooLarge(u64),

    #[error(transparent)]
    Extraction(DocumentError),

    #[error("no text to generate questions from")]
    EmptyInput,

    #[error("question generation failed: {0}")]
    Generation(#[from] LlmError),
}

impl From<DocumentError> for QuizError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::UnsupportedFormat(ext) => Self::UnsupportedFormat(ext),
            DocumentError::FileTooLarge(size) => Self::FileTooLarge(size),
            other => Self::Extraction(other),
        }
    }
}

impl QuizError {
    /// Stable machine-readable name of the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::FileTooLarge(_) => "file_too_large",
            Self::Extraction(_) => "extraction_failed",
            Self::EmptyInput => "empty_input",
            Self::Generation(_) => "generation_failed",
        }
    }
}
