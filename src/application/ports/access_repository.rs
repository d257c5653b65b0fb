use async_trait::async_trait;

use crate::domain::documents::permissions::PermissionGrant;

#[async_trait]
pub trait AccessRepository: Send + Sync {
    async fn grants_for_document(&self, doc_id: i64) -> anyhow::Result<Vec<PermissionGrant>>;
    // Assigning an existing grant is a no-op
    async fn assign(&self, grant: &PermissionGrant) -> anyhow::Result<()>;
    async fn revoke(&self, grant: &PermissionGrant) -> anyhow::Result<()>;
}
