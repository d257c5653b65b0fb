use chrono::{DateTime, Utc};

pub const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Clone)]
pub struct Document {
    pub id: i64,
    pub checksum: String,
    pub archive_checksum: Option<String>,
    pub title: String,
    pub owner_id: Option<i64>,
    pub filename: Option<String>,
    pub archive_filename: Option<String>,
    pub mime_type: String,
    pub page_count: Option<i32>,
    pub correspondent_id: Option<i64>,
    pub document_type_id: Option<i64>,
    pub storage_path_id: Option<i64>,
    pub tag_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Document {
    pub fn has_archive_version(&self) -> bool {
        self.archive_filename.is_some()
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME_TYPE
    }

    /// File name used for the original when the record carries none.
    pub fn default_filename(&self) -> String {
        format!("{:07}.pdf", self.id)
    }
}

/// Fields accepted when inserting a document record.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub checksum: String,
    pub title: String,
    pub owner_id: Option<i64>,
    pub filename: Option<String>,
    pub archive_filename: Option<String>,
    pub archive_checksum: Option<String>,
    pub mime_type: String,
    pub page_count: Option<i32>,
    pub correspondent_id: Option<i64>,
    pub document_type_id: Option<i64>,
    pub storage_path_id: Option<i64>,
    pub tag_ids: Vec<i64>,
}

impl NewDocument {
    pub fn new(checksum: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            checksum: checksum.into(),
            title: title.into(),
            owner_id: None,
            filename: None,
            archive_filename: None,
            archive_checksum: None,
            mime_type: PDF_MIME_TYPE.to_string(),
            page_count: None,
            correspondent_id: None,
            document_type_id: None,
            storage_path_id: None,
            tag_ids: Vec::new(),
        }
    }
}

/// File-level state rewritten after a page edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileState {
    pub checksum: String,
    pub archive_checksum: Option<String>,
    pub page_count: Option<i32>,
}
