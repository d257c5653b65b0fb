use std::path::Path;

use async_trait::async_trait;

use crate::application::ports::pdf_port::{PdfEngine, PdfError, PdfFile};

/// Loads and writes PDFs with lopdf on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

impl LopdfEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PdfEngine for LopdfEngine {
    async fn open(&self, path: &Path) -> Result<PdfFile, PdfError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            lopdf::Document::load(&path)
                .map(PdfFile::new)
                .map_err(|e| PdfError::Open {
                    reason: e.to_string(),
                    path,
                })
        })
        .await
        .map_err(|e| PdfError::Worker(e.to_string()))?
    }

    async fn save(&self, pdf: PdfFile, path: &Path) -> Result<(), PdfError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| PdfError::Save {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            }
            let mut document = pdf.into_document();
            document.compress();
            document
                .save(&path)
                .map(|_| ())
                .map_err(|e| PdfError::Save {
                    reason: e.to_string(),
                    path,
                })
        })
        .await
        .map_err(|e| PdfError::Worker(e.to_string()))?
    }
}
