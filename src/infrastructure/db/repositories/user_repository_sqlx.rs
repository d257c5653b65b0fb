use async_trait::async_trait;
use sqlx::Row;

use crate::application::ports::user_repository::{GroupRow, UserRepository, UserRow};
use crate::infrastructure::db::PgPool;

pub struct SqlxUserRepository {
    pub pool: PgPool,
}

impl SqlxUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn existing(&self, sql: &str, ids: &[i64]) -> anyhow::Result<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found: Vec<i64> = sqlx::query_scalar(sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.iter().copied().filter(|id| found.contains(id)).collect())
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create_user(&self, username: &str) -> anyhow::Result<UserRow> {
        let row = sqlx::query("INSERT INTO users (username) VALUES ($1) RETURNING id, username")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(UserRow {
            id: row.get("id"),
            username: row.get("username"),
        })
    }

    async fn create_group(&self, name: &str) -> anyhow::Result<GroupRow> {
        let row = sqlx::query("INSERT INTO groups (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(GroupRow {
            id: row.get("id"),
            name: row.get("name"),
        })
    }

    async fn existing_user_ids(&self, ids: &[i64]) -> anyhow::Result<Vec<i64>> {
        self.existing("SELECT id FROM users WHERE id = ANY($1)", ids)
            .await
    }

    async fn existing_group_ids(&self, ids: &[i64]) -> anyhow::Result<Vec<i64>> {
        self.existing("SELECT id FROM groups WHERE id = ANY($1)", ids)
            .await
    }
}
