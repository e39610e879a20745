use std::fmt;
use std::path::{Path, PathBuf};

use super::{DEFAULT_MAX_FILE_SIZE, DocumentError, DocumentLoader, PdfLoader, TextLoader};

/// The full text a quiz is generated from. Never mutated once extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText(String);

impl SourceText {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty or whitespace-only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SourceText {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for SourceText {
    fn from(text: &str) -> Self {
        Self(text.to_owned())
    }
}

impl AsRef<str> for SourceText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the text comes from: a text box or an uploaded document.
#[derive(Debug, Clone)]
pub enum TextSource {
    Raw(String),
    Upload { filename: String, bytes: Vec<u8> },
}

impl TextSource {
    #[must_use]
    pub fn upload(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::Upload {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Lowercased text after the last `.` of an uploaded file name, if any.
///
/// A dotfile such as `.txt` counts as having the extension `txt`.
#[must_use]
pub fn extension_of(filename: &str) -> Option<String> {
    let name = Path::new(filename).file_name()?.to_str()?;
    name.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Normalizes a [`TextSource`] into a single [`SourceText`].
#[derive(Debug, Clone)]
pub struct SourceAdapter {
    text: TextLoader,
    pdf: PdfLoader,
    max_file_size: u64,
}

impl Default for SourceAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE)
    }
}

impl SourceAdapter {
    #[must_use]
    pub fn new(max_file_size: u64) -> Self {
        Self {
            text: TextLoader,
            pdf: PdfLoader::default(),
            max_file_size,
        }
    }

    /// Put PDF scratch files in `dir` instead of the system temp dir.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pdf.temp_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Extract the text of `source`.
    ///
    /// The format is decided by the file extension before any byte is read, so
    /// an unsupported upload never reaches a loader.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::UnsupportedFormat`] for anything but `.txt` and `.pdf`,
    /// [`DocumentError::FileTooLarge`] above the size limit, and
    /// [`DocumentError::Extraction`] when the document cannot be decoded.
    pub async fn extract(&self, source: TextSource) -> Result<SourceText, DocumentError> {
        let (filename, bytes) = match source {
            TextSource::Raw(text) => return Ok(SourceText(text)),
            TextSource::Upload { filename, bytes } => (filename, bytes),
        };

        let ext = extension_of(&filename)
            .ok_or_else(|| DocumentError::UnsupportedFormat(filename.clone()))?;
        let is_text = self.text.supported_extensions().contains(&ext.as_str());
        let is_pdf = self.pdf.supported_extensions().contains(&ext.as_str());
        if !is_text && !is_pdf {
            return Err(DocumentError::UnsupportedFormat(format!(".{ext}")));
        }

        let size = bytes.len() as u64;
        if size > self.max_file_size {
            return Err(DocumentError::FileTooLarge(size));
        }

        let text = if is_text {
            self.text.load(&bytes)?
        } else {
            let pdf = self.pdf.clone();
            tokio::task::spawn_blocking(move || pdf.load(&bytes))
                .await
                .map_err(|e| DocumentError::Extraction(format!("PDF extraction task failed: {e}")))??
        };

        tracing::info!(file = %filename, chars = text.len(), "extracted upload text");
        Ok(SourceText(text))
    }
}
