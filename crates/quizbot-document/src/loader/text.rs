use super::super::{DocumentError, DocumentLoader};

#[derive(Debug, Clone, Copy, Default)]
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn load(&self, bytes: &[u8]) -> Result<String, DocumentError> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| DocumentError::Extraction(format!("text file is not valid UTF-8: {e}")))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt"]
    }
}
