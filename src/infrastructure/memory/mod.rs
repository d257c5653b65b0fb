//! Process-local repositories used by the in-process worker mode and by tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::user_repository::{GroupRow, UserRepository, UserRow};
use crate::domain::documents::document::{Document, FileState, NewDocument};
use crate::domain::documents::permissions::PermissionGrant;

#[derive(Default)]
struct State {
    next_document_id: i64,
    next_user_id: i64,
    next_group_id: i64,
    documents: BTreeMap<i64, Document>,
    users: BTreeMap<i64, UserRow>,
    groups: BTreeMap<i64, GroupRow>,
    grants: BTreeSet<PermissionGrant>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[async_trait]
impl DocumentRepository for InMemoryStore {
    async fn create(&self, doc: &NewDocument) -> anyhow::Result<Document> {
        let mut state = self.state.write().await;
        if state.documents.values().any(|d| d.checksum == doc.checksum) {
            anyhow::bail!("document with checksum {} already exists", doc.checksum);
        }
        let id = next_id(&mut state.next_document_id);
        let now = Utc::now();
        let mut tag_ids = doc.tag_ids.clone();
        tag_ids.sort_unstable();
        tag_ids.dedup();
        let created = Document {
            id,
            checksum: doc.checksum.clone(),
            archive_checksum: doc.archive_checksum.clone(),
            title: doc.title.clone(),
            owner_id: doc.owner_id,
            filename: doc.filename.clone(),
            archive_filename: doc.archive_filename.clone(),
            mime_type: doc.mime_type.clone(),
            page_count: doc.page_count,
            correspondent_id: doc.correspondent_id,
            document_type_id: doc.document_type_id,
            storage_path_id: doc.storage_path_id,
            tag_ids,
            created_at: now,
            modified_at: now,
        };
        state.documents.insert(id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<Document>> {
        Ok(self.state.read().await.documents.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[i64]) -> anyhow::Result<Vec<Document>> {
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        let state = self.state.read().await;
        Ok(wanted
            .into_iter()
            .filter_map(|id| state.documents.get(&id).cloned())
            .collect())
    }

    async fn set_owner(
        &self,
        ids: &[i64],
        owner_id: Option<i64>,
        only_unowned: bool,
    ) -> anyhow::Result<u64> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut changed = 0;
        for id in ids.iter().collect::<BTreeSet<_>>() {
            let Some(doc) = state.documents.get_mut(id) else {
                continue;
            };
            if only_unowned && doc.owner_id.is_some() {
                continue;
            }
            doc.owner_id = owner_id;
            doc.modified_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn update_file_state(&self, id: i64, file: &FileState) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        if let Some(doc) = state.documents.get_mut(&id) {
            doc.checksum = file.checksum.clone();
            doc.archive_checksum = file.archive_checksum.clone();
            doc.page_count = file.page_count;
            doc.modified_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl AccessRepository for InMemoryStore {
    async fn grants_for_document(&self, doc_id: i64) -> anyhow::Result<Vec<PermissionGrant>> {
        let state = self.state.read().await;
        Ok(state
            .grants
            .iter()
            .filter(|g| g.document_id == doc_id)
            .copied()
            .collect())
    }

    async fn assign(&self, grant: &PermissionGrant) -> anyhow::Result<()> {
        self.state.write().await.grants.insert(*grant);
        Ok(())
    }

    async fn revoke(&self, grant: &PermissionGrant) -> anyhow::Result<()> {
        self.state.write().await.grants.remove(grant);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, username: &str) -> anyhow::Result<UserRow> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == username) {
            anyhow::bail!("user {username} already exists");
        }
        let id = next_id(&mut state.next_user_id);
        let row = UserRow {
            id,
            username: username.to_string(),
        };
        state.users.insert(id, row.clone());
        Ok(row)
    }

    async fn create_group(&self, name: &str) -> anyhow::Result<GroupRow> {
        let mut state = self.state.write().await;
        if state.groups.values().any(|g| g.name == name) {
            anyhow::bail!("group {name} already exists");
        }
        let id = next_id(&mut state.next_group_id);
        let row = GroupRow {
            id,
            name: name.to_string(),
        };
        state.groups.insert(id, row.clone());
        Ok(row)
    }

    async fn existing_user_ids(&self, ids: &[i64]) -> anyhow::Result<Vec<i64>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| state.users.contains_key(id))
            .collect())
    }

    async fn existing_group_ids(&self, ids: &[i64]) -> anyhow::Result<Vec<i64>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| state.groups.contains_key(id))
            .collect())
    }
}
