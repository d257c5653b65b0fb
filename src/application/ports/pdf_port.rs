use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lopdf::Document;

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("failed to open {path}: {reason}")]
    Open { path: PathBuf, reason: String },
    #[error("failed to save {path}: {reason}")]
    Save { path: PathBuf, reason: String },
    #[error("malformed pdf: {0}")]
    Malformed(String),
    #[error("page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: u32, count: usize },
    #[error("page selection is empty")]
    EmptySelection,
    #[error("pdf worker failed: {0}")]
    Worker(String),
}

impl From<lopdf::Error> for PdfError {
    fn from(err: lopdf::Error) -> Self {
        PdfError::Malformed(err.to_string())
    }
}

/// A parsed PDF held in memory.
#[derive(Debug, Clone)]
pub struct PdfFile {
    document: Document,
}

impl PdfFile {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    pub fn version(&self) -> &str {
        &self.document.version
    }
}

#[async_trait]
pub trait PdfEngine: Send + Sync {
    async fn open(&self, path: &Path) -> Result<PdfFile, PdfError>;
    // Overwrites `path` when it already exists
    async fn save(&self, pdf: PdfFile, path: &Path) -> Result<(), PdfError>;
}
