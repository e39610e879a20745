//! Text source adapter: turns pasted text or an uploaded `.txt` / `.pdf` document
//! into a single [`SourceText`] blob.

pub mod error;
pub mod loader;
pub mod source;

pub use error::DocumentError;
pub use loader::{PdfLoader, TextLoader};
pub use source::{SourceAdapter, SourceText, TextSource, extension_of};

/// Default maximum upload size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Decodes the raw bytes of one document format into plain text.
pub trait DocumentLoader: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be decoded as this format.
    fn load(&self, bytes: &[u8]) -> Result<String, DocumentError>;

    fn supported_extensions(&self) -> &[&str];
}
