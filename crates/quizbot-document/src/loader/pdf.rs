use std::any::Any;
use std::io::Write;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::super::{DocumentError, DocumentLoader};

/// Extracts the text of every page of a PDF, in page order.
///
/// `pdf-extract` reads from a path, so the upload is spilled into a scratch
/// file that is unlinked when it goes out of scope, on success and on failure.
#[derive(Debug, Clone, Default)]
pub struct PdfLoader {
    /// Directory for the scratch file; the system temp dir when `None`.
    pub temp_dir: Option<PathBuf>,
}

impl PdfLoader {
    fn scratch_file(&self) -> Result<NamedTempFile, DocumentError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("quizbot-").suffix(".pdf");
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(file)
    }
}

impl DocumentLoader for PdfLoader {
    fn load(&self, bytes: &[u8]) -> Result<String, DocumentError> {
        let mut scratch = self.scratch_file()?;
        scratch.write_all(bytes)?;
        scratch.flush()?;

        let pages = extract_pages(scratch.path())?;
        tracing::debug!(pages = pages.len(), "extracted PDF text");
        Ok(pages.concat())
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}

fn extract_pages(path: &Path) -> Result<Vec<String>, DocumentError> {
    // pdf-extract panics on some malformed inputs
    match catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_by_pages(path))) {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(DocumentError::Extraction(e.to_string())),
        Err(payload) => Err(DocumentError::Extraction(format!(
            "PDF parser panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
