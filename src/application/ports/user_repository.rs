use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct GroupRow {
    pub id: i64,
    pub name: String,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, username: &str) -> anyhow::Result<UserRow>;
    async fn create_group(&self, name: &str) -> anyhow::Result<GroupRow>;
    // Both return the subset of `ids` that exist, in input order
    async fn existing_user_ids(&self, ids: &[i64]) -> anyhow::Result<Vec<i64>>;
    async fn existing_group_ids(&self, ids: &[i64]) -> anyhow::Result<Vec<i64>>;
}
