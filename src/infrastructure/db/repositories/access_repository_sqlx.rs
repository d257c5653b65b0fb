use async_trait::async_trait;
use sqlx::Row;

use crate::application::ports::access_repository::AccessRepository;
use crate::domain::documents::permissions::{Capability, PermissionGrant, Subject};
use crate::infrastructure::db::PgPool;

pub struct SqlxAccessRepository {
    pub pool: PgPool,
}

impl SqlxAccessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessRepository for SqlxAccessRepository {
    async fn grants_for_document(&self, doc_id: i64) -> anyhow::Result<Vec<PermissionGrant>> {
        let rows = sqlx::query(
            r#"SELECT 'user' AS kind, user_id AS subject_id, capability
                 FROM document_user_permissions WHERE document_id = $1
               UNION ALL
               SELECT 'group' AS kind, group_id AS subject_id, capability
                 FROM document_group_permissions WHERE document_id = $1
               ORDER BY kind, subject_id, capability"#,
        )
        .bind(doc_id)
        .fetch_all(&self.pool)
        .await?;

        let mut grants = Vec::with_capacity(rows.len());
        for r in rows {
            let kind: String = r.get("kind");
            let subject_id: i64 = r.get("subject_id");
            let raw: String = r.get("capability");
            let Some(capability) = Capability::parse(&raw) else {
                tracing::warn!(document_id = doc_id, capability = %raw, "unknown_capability_row");
                continue;
            };
            let subject = if kind == "user" {
                Subject::User(subject_id)
            } else {
                Subject::Group(subject_id)
            };
            grants.push(PermissionGrant {
                document_id: doc_id,
                subject,
                capability,
            });
        }
        Ok(grants)
    }

    async fn assign(&self, grant: &PermissionGrant) -> anyhow::Result<()> {
        let (sql, subject_id) = match grant.subject {
            Subject::User(id) => (
                "INSERT INTO document_user_permissions (document_id, user_id, capability) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
                id,
            ),
            Subject::Group(id) => (
                "INSERT INTO document_group_permissions (document_id, group_id, capability) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
                id,
            ),
        };
        sqlx::query(sql)
            .bind(grant.document_id)
            .bind(subject_id)
            .bind(grant.capability.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn revoke(&self, grant: &PermissionGrant) -> anyhow::Result<()> {
        let (sql, subject_id) = match grant.subject {
            Subject::User(id) => (
                "DELETE FROM document_user_permissions WHERE document_id = $1 AND user_id = $2 AND capability = $3",
                id,
            ),
            Subject::Group(id) => (
                "DELETE FROM document_group_permissions WHERE document_id = $1 AND group_id = $2 AND capability = $3",
                id,
            ),
        };
        sqlx::query(sql)
            .bind(grant.document_id)
            .bind(subject_id)
            .bind(grant.capability.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
