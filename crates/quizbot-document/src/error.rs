#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("file too large: {0} bytes")]
    FileTooLarge(u64),

    #[error("text extraction failed: {0}")]
    Extraction(String),
}

impl DocumentError {
    /// `true` when the document was recognized but could not be turned into text.
    #[must_use]
    pub fn is_extraction_failure(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Extraction(_))
    }
}
