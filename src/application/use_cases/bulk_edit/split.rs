use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::pdf_port::{PdfEngine, PdfError};
use crate::application::ports::storage_port::StoragePort;
use crate::application::ports::task_queue::TaskQueue;
use crate::application::services::pdf;
use crate::application::use_cases::bulk_edit::{LOG_TARGET, OK};
use crate::domain::documents::document::Document;
use crate::domain::documents::overrides::DocumentMetadataOverrides;
use crate::domain::tasks::TaskRequest;

/// `<id>_<ordinal>_<first>-<last>.pdf` for the group at 1-based `ordinal`.
pub fn split_filename(doc_id: i64, ordinal: usize, group: &[u32]) -> String {
    let first = group.first().copied().unwrap_or_default();
    let last = group.last().copied().unwrap_or_default();
    format!("{doc_id}_{ordinal}_{first}-{last}.pdf")
}

pub struct SplitDocument<'a, D, A, S, P, Q>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: StoragePort + ?Sized,
    P: PdfEngine + ?Sized,
    Q: TaskQueue + ?Sized,
{
    pub documents: &'a D,
    pub access: &'a A,
    pub storage: &'a S,
    pub pdf: &'a P,
    pub tasks: &'a Q,
}

impl<'a, D, A, S, P, Q> SplitDocument<'a, D, A, S, P, Q>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: StoragePort + ?Sized,
    P: PdfEngine + ?Sized,
    Q: TaskQueue + ?Sized,
{
    pub async fn execute(&self, doc_ids: &[i64], pages: &[Vec<u32>]) -> anyhow::Result<&'static str> {
        let Some(&doc_id) = doc_ids.first() else {
            anyhow::bail!("split needs a document");
        };
        if doc_ids.len() > 1 {
            warn!(
                target: LOG_TARGET,
                ignored = doc_ids.len() - 1,
                "Split works on a single document, ignoring the rest"
            );
        }
        let doc = self
            .documents
            .get_by_id(doc_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("document {doc_id} not found"))?;

        info!(
            target: LOG_TARGET,
            document_id = doc.id,
            parts = pages.len(),
            "Attempting to split document {} into {} documents",
            doc.id,
            pages.len()
        );

        let outputs = match self.write_parts(&doc, pages).await {
            Ok(outputs) => outputs,
            Err(e) => {
                error!(
                    target: LOG_TARGET,
                    document_id = doc.id,
                    error = %e,
                    "Error splitting document {}: {}",
                    doc.id,
                    e
                );
                return Ok(OK);
            }
        };

        let grants = self.access.grants_for_document(doc.id).await?;
        for (idx, filepath) in outputs.into_iter().enumerate() {
            let overrides = DocumentMetadataOverrides::from_document(&doc, &grants)
                .with_title(format!("{} (split {})", doc.title, idx + 1));
            info!(target: LOG_TARGET, path = %filepath.display(), "Adding task for document");
            self.tasks
                .submit(TaskRequest::consume_file(filepath, overrides))
                .await?;
        }
        Ok(OK)
    }

    // All parts are written before anything is queued
    async fn write_parts(&self, doc: &Document, pages: &[Vec<u32>]) -> Result<Vec<PathBuf>, PdfError> {
        let source = self.pdf.open(&self.storage.source_path(doc)).await?;
        let scratch = self.storage.scratch_dir();
        let mut outputs = Vec::with_capacity(pages.len());
        for (idx, group) in pages.iter().enumerate() {
            let part = pdf::extract_pages(&source, group)?;
            let filepath = scratch.join(split_filename(doc.id, idx + 1, group));
            self.pdf.save(part, &filepath).await?;
            outputs.push(filepath);
        }
        Ok(outputs)
    }
}
