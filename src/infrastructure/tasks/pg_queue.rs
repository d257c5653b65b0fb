use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};
use sqlx::postgres::PgListener;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::application::dto::bulk_edit::BulkEditRequest;
use crate::application::ports::task_queue::TaskQueue;
use crate::domain::tasks::TaskRequest;
use crate::infrastructure::db::PgPool;

/// Persists tasks to `task_queue` and wakes consumers with NOTIFY.
#[derive(Clone)]
pub struct PgTaskQueue {
    pool: PgPool,
    channel: String,
}

impl PgTaskQueue {
    pub fn new(pool: PgPool, channel: impl Into<String>) -> Self {
        Self {
            pool,
            channel: channel.into(),
        }
    }
}

#[async_trait]
impl TaskQueue for PgTaskQueue {
    async fn submit(&self, task: TaskRequest) -> anyhow::Result<()> {
        let payload = serde_json::to_value(&task).context("task_serialize")?;
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO task_queue (id, kind, payload) VALUES ($1, $2, $3::jsonb)")
            .bind(task.id)
            .bind(task.kind.name())
            .bind(payload)
            .execute(&mut *tx)
            .await
            .context("task_insert")?;
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(&self.channel)
            .bind(task.id.to_string())
            .execute(&mut *tx)
            .await
            .context("task_pg_notify")?;
        tx.commit().await?;
        tracing::debug!(task_id = %task.id, task = task.kind.name(), "task_submitted");
        Ok(())
    }
}

/// Streams bulk edit requests published on a Postgres NOTIFY channel.
#[derive(Clone)]
pub struct PgBulkEditListener {
    pool: PgPool,
    channel: String,
}

impl PgBulkEditListener {
    pub fn new(pool: PgPool, channel: impl Into<String>) -> Self {
        Self {
            pool,
            channel: channel.into(),
        }
    }

    pub async fn subscribe(&self) -> anyhow::Result<BoxStream<'static, BulkEditRequest>> {
        let (tx, rx) = mpsc::unbounded_channel::<BulkEditRequest>();
        let pool = self.pool.clone();
        let channel = self.channel.clone();

        tokio::spawn(async move {
            loop {
                let mut listener = connect_listener(&pool, &channel).await;
                while let Some(payload) = next_payload(&mut listener, &channel).await {
                    let Some(request) = decode_request(&payload) else {
                        continue;
                    };
                    if tx.send(request).is_err() {
                        return;
                    }
                }
                sleep(RECV_RETRY).await;
            }
        });

        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}

const CONNECT_RETRY: Duration = Duration::from_secs(1);
const RECV_RETRY: Duration = Duration::from_millis(500);

/// Retries until the channel is being listened on.
async fn connect_listener(pool: &PgPool, channel: &str) -> PgListener {
    loop {
        match PgListener::connect_with(pool).await {
            Ok(mut listener) => match listener.listen(channel).await {
                Ok(()) => return listener,
                Err(err) => {
                    tracing::error!(error = ?err, channel, "bulk_edit_listener_listen_failed")
                }
            },
            Err(err) => tracing::error!(error = ?err, "bulk_edit_listener_connect_failed"),
        }
        sleep(CONNECT_RETRY).await;
    }
}

// None means the connection is gone and must be rebuilt.
async fn next_payload(listener: &mut PgListener, channel: &str) -> Option<String> {
    match listener.recv().await {
        Ok(notification) => Some(notification.payload().to_owned()),
        Err(err) => {
            tracing::error!(error = ?err, channel, "bulk_edit_listener_recv_failed");
            None
        }
    }
}

/// Parses a NOTIFY payload and drops anything that is not a runnable bulk edit.
pub(crate) fn decode_request(payload: &str) -> Option<BulkEditRequest> {
    let request = match serde_json::from_str::<BulkEditRequest>(payload) {
        Ok(request) => request,
        Err(err) => {
            tracing::error!(error = ?err, raw_payload = payload, "bulk_edit_listener_decode_failed");
            return None;
        }
    };
    if let Err(err) = request.clone().into_command() {
        tracing::warn!(
            error = %err,
            method = %request.method,
            documents = request.documents.len(),
            "bulk_edit_request_rejected"
        );
        return None;
    }
    Some(request)
}
