use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::documents::document::{Document as DomainDocument, FileState, NewDocument};
use crate::infrastructure::db::PgPool;

const SELECT_DOCUMENT: &str = r#"SELECT d.id, d.checksum, d.archive_checksum, d.title, d.owner_id,
           d.filename, d.archive_filename, d.mime_type, d.page_count,
           d.correspondent_id, d.document_type_id, d.storage_path_id,
           d.created_at, d.modified_at,
           ARRAY(SELECT dt.tag_id FROM document_tags dt
                 WHERE dt.document_id = d.id ORDER BY dt.tag_id) AS tag_ids
    FROM documents d"#;

pub struct SqlxDocumentRepository {
    pub pool: PgPool,
}

impl SqlxDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: PgRow) -> DomainDocument {
    DomainDocument {
        id: r.get("id"),
        checksum: r.get("checksum"),
        archive_checksum: r.get("archive_checksum"),
        title: r.get("title"),
        owner_id: r.get("owner_id"),
        filename: r.get("filename"),
        archive_filename: r.get("archive_filename"),
        mime_type: r.get("mime_type"),
        page_count: r.get("page_count"),
        correspondent_id: r.get("correspondent_id"),
        document_type_id: r.get("document_type_id"),
        storage_path_id: r.get("storage_path_id"),
        tag_ids: r.try_get("tag_ids").unwrap_or_default(),
        created_at: r.get("created_at"),
        modified_at: r.get("modified_at"),
    }
}

#[async_trait]
impl DocumentRepository for SqlxDocumentRepository {
    async fn create(&self, doc: &NewDocument) -> anyhow::Result<DomainDocument> {
        let mut tx = self.pool.begin().await?;
        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO documents (checksum, archive_checksum, title, owner_id, filename,
                   archive_filename, mime_type, page_count, correspondent_id,
                   document_type_id, storage_path_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
               RETURNING id"#,
        )
        .bind(&doc.checksum)
        .bind(&doc.archive_checksum)
        .bind(&doc.title)
        .bind(doc.owner_id)
        .bind(&doc.filename)
        .bind(&doc.archive_filename)
        .bind(&doc.mime_type)
        .bind(doc.page_count)
        .bind(doc.correspondent_id)
        .bind(doc.document_type_id)
        .bind(doc.storage_path_id)
        .fetch_one(&mut *tx)
        .await?;

        if !doc.tag_ids.is_empty() {
            sqlx::query(
                "INSERT INTO document_tags (document_id, tag_id) SELECT $1, UNNEST($2::bigint[]) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(&doc.tag_ids)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("document {id} vanished after insert"))
    }

    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<DomainDocument>> {
        let row = sqlx::query(&format!("{SELECT_DOCUMENT} WHERE d.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(map_row))
    }

    async fn get_many(&self, ids: &[i64]) -> anyhow::Result<Vec<DomainDocument>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!(
            "{SELECT_DOCUMENT} WHERE d.id = ANY($1) ORDER BY d.id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(map_row).collect())
    }

    async fn set_owner(
        &self,
        ids: &[i64],
        owner_id: Option<i64>,
        only_unowned: bool,
    ) -> anyhow::Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = if only_unowned {
            "UPDATE documents SET owner_id = $1, modified_at = now() WHERE id = ANY($2) AND owner_id IS NULL"
        } else {
            "UPDATE documents SET owner_id = $1, modified_at = now() WHERE id = ANY($2)"
        };
        let res = sqlx::query(sql)
            .bind(owner_id)
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    async fn update_file_state(&self, id: i64, state: &FileState) -> anyhow::Result<()> {
        sqlx::query(
            r#"UPDATE documents
               SET checksum = $2, archive_checksum = $3, page_count = $4, modified_at = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(&state.checksum)
        .bind(&state.archive_checksum)
        .bind(state.page_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
