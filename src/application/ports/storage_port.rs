use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::documents::document::Document;

#[async_trait]
pub trait StoragePort: Send + Sync {
    fn scratch_dir(&self) -> PathBuf;
    fn source_path(&self, doc: &Document) -> PathBuf;
    // None when the document has no archive version
    fn archive_path(&self, doc: &Document) -> Option<PathBuf>;
    async fn checksum(&self, path: &Path) -> anyhow::Result<String>;
}
