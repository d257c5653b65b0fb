use tracing::{error, info, warn};

use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::pdf_port::{PdfEngine, PdfError};
use crate::application::ports::storage_port::StoragePort;
use crate::application::ports::task_queue::TaskQueue;
use crate::application::services::pdf;
use crate::application::use_cases::bulk_edit::{LOG_TARGET, OK};
use crate::domain::documents::document::{Document, FileState};
use crate::domain::tasks::TaskRequest;

pub struct RotateDocuments<'a, D, S, P, Q>
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

impl<'a, D, S, P, Q> RotateDocuments<'a, D, S, P, Q>
where
    D: DocumentRepository + ?Sized,
    S: StoragePort + ?Sized,
    P: PdfEngine + ?Sized,
    Q: TaskQueue + ?Sized,
{
    pub async fn execute(&self, doc_ids: &[i64], degrees: i32) -> anyhow::Result<&'static str> {
        if degrees % 90 != 0 {
            anyhow::bail!("degrees must be a multiple of 90, got {degrees}");
        }
        info!(
            target: LOG_TARGET,
            count = doc_ids.len(),
            degrees,
            "Attempting to rotate documents"
        );

        let docs = self.documents.get_many(doc_ids).await?;
        let mut archive_tasks = Vec::new();
        let mut affected = Vec::new();

        for doc in &docs {
            if !doc.is_pdf() {
                warn!(
                    target: LOG_TARGET,
                    document_id = doc.id,
                    mime_type = %doc.mime_type,
                    "Document {} is not a PDF, skipping rotation",
                    doc.id
                );
                continue;
            }
            if let Err(e) = self.rotate_files(doc, degrees).await {
                error!(
                    target: LOG_TARGET,
                    document_id = doc.id,
                    error = %e,
                    "Error rotating document {}: {}",
                    doc.id,
                    e
                );
                continue;
            }

            let state = self.file_state(doc).await?;
            self.documents.update_file_state(doc.id, &state).await?;
            info!(target: LOG_TARGET, document_id = doc.id, degrees, "Rotated document {} by {} degrees", doc.id, degrees);
            archive_tasks.push(TaskRequest::update_document_archive_file(doc.id));
            affected.push(doc.id);
        }

        for task in archive_tasks {
            self.tasks.submit(task).await?;
        }
        if !affected.is_empty() {
            self.tasks
                .submit(TaskRequest::bulk_update_documents(affected))
                .await?;
        }
        Ok(OK)
    }

    // Both files are rotated in memory before either is written back
    async fn rotate_files(&self, doc: &Document, degrees: i32) -> Result<(), PdfError> {
        let source_path = self.storage.source_path(doc);
        let mut source = self.pdf.open(&source_path).await?;
        pdf::rotate_pages(&mut source, degrees)?;

        let archive = match self.storage.archive_path(doc) {
            Some(path) => {
                let mut archive = self.pdf.open(&path).await?;
                pdf::rotate_pages(&mut archive, degrees)?;
                Some((archive, path))
            }
            None => None,
        };

        self.pdf.save(source, &source_path).await?;
        if let Some((archive, path)) = archive {
            self.pdf.save(archive, &path).await?;
        }
        Ok(())
    }

    async fn file_state(&self, doc: &Document) -> anyhow::Result<FileState> {
        let checksum = self.storage.checksum(&self.storage.source_path(doc)).await?;
        let archive_checksum = match self.storage.archive_path(doc) {
            Some(path) => Some(self.storage.checksum(&path).await?),
            None => None,
        };
        Ok(FileState {
            checksum,
            archive_checksum,
            page_count: doc.page_count,
        })
    }
}
