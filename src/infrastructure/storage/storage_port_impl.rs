use std::fmt::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::application::ports::storage_port::StoragePort;
use crate::bootstrap::config::StorageDirs;
use crate::domain::documents::document::Document;

pub struct FsStoragePort {
    pub originals_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub scratch_dir: PathBuf,
}

impl FsStoragePort {
    pub fn new(dirs: &StorageDirs) -> Self {
        Self {
            originals_dir: dirs.originals_dir.clone(),
            archive_dir: dirs.archive_dir.clone(),
            scratch_dir: dirs.scratch_dir.clone(),
        }
    }
}

#[async_trait::async_trait]
impl StoragePort for FsStoragePort {
    fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone()
    }

    fn source_path(&self, doc: &Document) -> PathBuf {
        match &doc.filename {
            Some(name) => self.originals_dir.join(name),
            None => self.originals_dir.join(doc.default_filename()),
        }
    }

    fn archive_path(&self, doc: &Document) -> Option<PathBuf> {
        doc.archive_filename
            .as_ref()
            .map(|name| self.archive_dir.join(name))
    }

    async fn checksum(&self, path: &Path) -> anyhow::Result<String> {
        let bytes = tokio::fs::read(path).await?;
        let digest = Sha256::digest(&bytes);
        let mut out = String::with_capacity(digest.len() * 2);
        for b in digest {
            let _ = write!(out, "{:02x}", b);
        }
        Ok(out)
    }
}
