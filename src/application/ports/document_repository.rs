use async_trait::async_trait;

use crate::domain::documents::document::{Document as DomainDocument, FileState, NewDocument};

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create(&self, doc: &NewDocument) -> anyhow::Result<DomainDocument>;

    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<DomainDocument>>;

    // Unknown ids are left out; result is ordered by id
    async fn get_many(&self, ids: &[i64]) -> anyhow::Result<Vec<DomainDocument>>;

    // only_unowned: restrict the update to documents whose owner is unset.
    // Returns the number of rows changed.
    async fn set_owner(
        &self,
        ids: &[i64],
        owner_id: Option<i64>,
        only_unowned: bool,
    ) -> anyhow::Result<u64>;

    async fn update_file_state(&self, id: i64, state: &FileState) -> anyhow::Result<()>;
}
