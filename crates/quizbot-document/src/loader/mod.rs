mod pdf;
mod text;

pub use pdf::PdfLoader;
pub use text::TextLoader;

#[cfg(test)]
pub(crate) use pdf::tests::build_pdf;
