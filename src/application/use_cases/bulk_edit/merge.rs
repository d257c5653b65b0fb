use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::pdf_port::PdfEngine;
use crate::application::ports::storage_port::StoragePort;
use crate::application::ports::task_queue::TaskQueue;
use crate::application::services::pdf;
use crate::application::use_cases::bulk_edit::{LOG_TARGET, OK};
use crate::domain::documents::overrides::DocumentMetadataOverrides;
use crate::domain::tasks::TaskRequest;

const MAX_STEM_CHARS: usize = 100;

/// `<ids joined by "_", first 100 chars>_merged.pdf`
pub fn merged_filename(doc_ids: &[i64]) -> String {
    let joined = doc_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join("_");
    let stem: String = joined.chars().take(MAX_STEM_CHARS).collect();
    format!("{stem}_merged.pdf")
}

pub struct MergeDocuments<'a, D, A, S, P, Q>
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

impl<'a, D, A, S, P, Q> MergeDocuments<'a, D, A, S, P, Q>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    S: StoragePort + ?Sized,
    P: PdfEngine + ?Sized,
    Q: TaskQueue + ?Sized,
{
    pub async fn execute(
        &self,
        doc_ids: &[i64],
        metadata_document_id: Option<i64>,
    ) -> anyhow::Result<&'static str> {
        info!(
            target: LOG_TARGET,
            count = doc_ids.len(),
            "Attempting to merge documents into a single document"
        );
        let docs = self.documents.get_many(doc_ids).await?;

        let mut sources = Vec::new();
        // doc_ids order, not store order
        for doc_id in doc_ids {
            let Some(doc) = docs.iter().find(|d| d.id == *doc_id) else {
                warn!(target: LOG_TARGET, document_id = doc_id, "Document {} not found, skipping", doc_id);
                continue;
            };
            let path = if doc.has_archive_version() {
                self.storage
                    .archive_path(doc)
                    .unwrap_or_else(|| self.storage.source_path(doc))
            } else {
                self.storage.source_path(doc)
            };
            match self.pdf.open(&path).await {
                Ok(file) => sources.push(file),
                Err(e) => {
                    error!(
                        target: LOG_TARGET,
                        document_id = doc.id,
                        error = %e,
                        "Error merging document {}, it will not be included in the merge: {}",
                        doc.id,
                        e
                    );
                }
            }
        }

        if sources.is_empty() {
            warn!(target: LOG_TARGET, "No documents were merged");
            return Ok(OK);
        }

        let filepath: PathBuf = self.storage.scratch_dir().join(merged_filename(doc_ids));
        let merged = match pdf::concat(sources) {
            Ok(merged) => merged,
            Err(e) => {
                error!(target: LOG_TARGET, error = %e, "Error combining pages for merge: {}", e);
                return Ok(OK);
            }
        };
        if let Err(e) = self.pdf.save(merged, &filepath).await {
            error!(
                target: LOG_TARGET,
                path = %filepath.display(),
                error = %e,
                "Error saving merged document: {}",
                e
            );
            return Ok(OK);
        }

        let overrides = match metadata_document_id {
            Some(meta_id) => match docs.iter().find(|d| d.id == meta_id) {
                Some(meta_doc) => {
                    let grants = self.access.grants_for_document(meta_doc.id).await?;
                    DocumentMetadataOverrides::from_document(meta_doc, &grants)
                        .with_title(format!("{} (merged)", meta_doc.title))
                }
                None => {
                    warn!(
                        target: LOG_TARGET,
                        document_id = meta_id,
                        "Metadata document {} is not part of the merge, ignoring",
                        meta_id
                    );
                    DocumentMetadataOverrides::default()
                }
            },
            None => DocumentMetadataOverrides::default(),
        };

        info!(target: LOG_TARGET, path = %filepath.display(), "Adding merged document to the task queue");
        self.tasks
            .submit(TaskRequest::consume_file(filepath, overrides))
            .await?;
        Ok(OK)
    }
}
