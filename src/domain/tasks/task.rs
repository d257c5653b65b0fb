use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::documents::overrides::DocumentMetadataOverrides;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    ConsumeFolder,
    ApiUpload,
    MailFetch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumableDocument {
    pub source: DocumentSource,
    pub original_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskKind {
    ConsumeFile {
        input: ConsumableDocument,
        overrides: DocumentMetadataOverrides,
    },
    BulkUpdateDocuments {
        document_ids: Vec<i64>,
    },
    UpdateDocumentArchiveFile {
        document_id: i64,
    },
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::ConsumeFile { .. } => "consume_file",
            TaskKind::BulkUpdateDocuments { .. } => "bulk_update_documents",
            TaskKind::UpdateDocumentArchiveFile { .. } => "update_document_archive_file",
        }
    }
}

/// A unit of deferred work handed to the task queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: TaskKind,
}

impl TaskRequest {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
        }
    }

    pub fn consume_file(original_file: PathBuf, overrides: DocumentMetadataOverrides) -> Self {
        Self::new(TaskKind::ConsumeFile {
            input: ConsumableDocument {
                source: DocumentSource::ConsumeFolder,
                original_file,
            },
            overrides,
        })
    }

    pub fn bulk_update_documents(document_ids: Vec<i64>) -> Self {
        Self::new(TaskKind::BulkUpdateDocuments { document_ids })
    }

    pub fn update_document_archive_file(document_id: i64) -> Self {
        Self::new(TaskKind::UpdateDocumentArchiveFile { document_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_kind_tag() {
        let task = TaskRequest::bulk_update_documents(vec![1, 2]);
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["kind"], "bulk_update_documents");
        assert_eq!(value["document_ids"], serde_json::json!([1, 2]));

        let back: TaskRequest = serde_json::from_value(value).unwrap();
        assert_eq!(back, task);
    }
}
