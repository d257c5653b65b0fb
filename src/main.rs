use std::sync::Arc;

use dotenvy::dotenv;
use futures_util::StreamExt;
use tracing::{error, info};

use docbulk::application::ports::task_queue::TaskQueue;
use docbulk::bootstrap::app_context::{AppContext, AppServices};
use docbulk::bootstrap::config::{Config, TaskQueueBackend};
use docbulk::infrastructure::db::repositories::access_repository_sqlx::SqlxAccessRepository;
use docbulk::infrastructure::db::repositories::document_repository_sqlx::SqlxDocumentRepository;
use docbulk::infrastructure::db::repositories::user_repository_sqlx::SqlxUserRepository;
use docbulk::infrastructure::pdf::LopdfEngine;
use docbulk::infrastructure::storage::FsStoragePort;
use docbulk::infrastructure::tasks::{BroadcastTaskQueue, PgBulkEditListener, PgTaskQueue};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "docbulk=debug,sqlx=warn".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(?cfg, "Starting bulk edit worker");

    cfg.storage.ensure().await?;

    // Database
    let pool = docbulk::infrastructure::db::connect_pool(&cfg.database_url).await?;
    docbulk::infrastructure::db::migrate(&pool).await?;

    let mut task_events = None;
    let task_queue: Arc<dyn TaskQueue> = match cfg.task_queue_backend {
        TaskQueueBackend::Postgres => {
            Arc::new(PgTaskQueue::new(pool.clone(), cfg.task_channel.clone()))
        }
        TaskQueueBackend::InProcess => {
            let (tx, _) = tokio::sync::broadcast::channel(256);
            task_events = Some(tx.clone());
            Arc::new(BroadcastTaskQueue::new(tx))
        }
    };

    let mut services = AppServices::new(
        Arc::new(SqlxDocumentRepository::new(pool.clone())),
        Arc::new(SqlxAccessRepository::new(pool.clone())),
        Arc::new(SqlxUserRepository::new(pool.clone())),
        Arc::new(FsStoragePort::new(&cfg.storage)),
        Arc::new(LopdfEngine::new()),
        task_queue,
    );
    if let Some(tx) = task_events {
        services = services.with_task_events(tx);
    }
    let ctx = AppContext::new(cfg.clone(), services);

    if cfg.task_queue_backend == TaskQueueBackend::InProcess {
        let mut tasks = ctx.subscribe_tasks();
        tokio::spawn(async move {
            while let Some(task) = tasks.next().await {
                info!(task_id = %task.id, task = task.kind.name(), "task_received");
            }
        });
    }

    let listener = PgBulkEditListener::new(pool.clone(), cfg.bulk_edit_channel.clone());
    let mut requests = listener.subscribe().await?;
    info!(channel = %cfg.bulk_edit_channel, "bulk_edit_listening");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown_signal_received");
                break;
            }
            next = requests.next() => {
                let Some(request) = next else {
                    error!("bulk_edit_listener_closed");
                    break;
                };
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    let method = request.method.clone();
                    match ctx.bulk_edit(request).await {
                        Ok(status) => info!(%method, status, "bulk_edit_finished"),
                        Err(err) => error!(%method, error = ?err, "bulk_edit_failed"),
                    }
                });
            }
        }
    }

    Ok(())
}
