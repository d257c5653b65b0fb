use tracing::{error, info, warn};

use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::pdf_port::{PdfEngine, PdfError};
use crate::application::ports::storage_port::StoragePort;
use crate::application::ports::task_queue::TaskQueue;
use crate::application::services::pdf;
use crate::application::use_cases::bulk_edit::{LOG_TARGET, OK};
use crate::domain::documents::document::{Document, FileState};
use crate::domain::tasks::TaskRequest;

pub struct DeletePages<'a, D, S, P, Q>
where
    D: DocumentRepository + ?Sized,
    S: StoragePort + ?Sized,
    P: PdfEngine + ?Sized,
    Q: TaskQueue + ?Sized,
{
    pub documents: &'a D,
    pub storage: &'a S,
    pub pdf: &'a P,
    pub tasks: &'a Q,
}

impl<'a, D, S, P, Q> DeletePages<'a, D, S, P, Q>
where
    D: DocumentRepository + ?Sized,
    S: StoragePort + ?Sized,
    P: PdfEngine + ?Sized,
    Q: TaskQueue + ?Sized,
{
    pub async fn execute(&self, doc_ids: &[i64], pages: &[u32]) -> anyhow::Result<&'static str> {
        let Some(&doc_id) = doc_ids.first() else {
            anyhow::bail!("delete_pages needs a document");
        };
        if doc_ids.len() > 1 {
            warn!(
                target: LOG_TARGET,
                ignored = doc_ids.len() - 1,
                "Page deletion works on a single document, ignoring the rest"
            );
        }
        let doc = self
            .documents
            .get_by_id(doc_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("document {doc_id} not found"))?;

        let mut pages = pages.to_vec();
        pages.sort_unstable();
        pages.dedup();
        info!(
            target: LOG_TARGET,
            document_id = doc.id,
            pages = ?pages,
            "Attempting to delete pages from document"
        );

        if let Err(e) = self.rewrite(&doc, &pages).await {
            error!(
                target: LOG_TARGET,
                document_id = doc.id,
                error = %e,
                "Error deleting pages from document {}: {}",
                doc.id,
                e
            );
            return Ok(OK);
        }

        let checksum = self.storage.checksum(&self.storage.source_path(&doc)).await?;
        let state = FileState {
            checksum,
            archive_checksum: doc.archive_checksum.clone(),
            page_count: doc.page_count.map(|n| n - pages.len() as i32),
        };
        self.documents.update_file_state(doc.id, &state).await?;
        self.tasks
            .submit(TaskRequest::update_document_archive_file(doc.id))
            .await?;
        info!(target: LOG_TARGET, document_id = doc.id, pages = ?pages, "Deleted pages from document {}", doc.id);
        Ok(OK)
    }

    async fn rewrite(&self, doc: &Document, pages: &[u32]) -> Result<(), PdfError> {
        let path = self.storage.source_path(doc);
        let source = self.pdf.open(&path).await?;
        let trimmed = pdf::remove_pages(&source, pages)?;
        self.pdf.save(trimmed, &path).await
    }
}
