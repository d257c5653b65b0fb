mod common;

use std::sync::Arc;

use futures_util::StreamExt;
use serde_json::json;

use docbulk::application::dto::bulk_edit::BulkEditRequest;
use docbulk::application::use_cases::bulk_edit::OK;
use docbulk::application::use_cases::bulk_edit::dispatch::ExecuteBulkEdit;
use docbulk::bootstrap::app_context::{AppContext, AppServices};
use docbulk::bootstrap::config::{Config, TaskQueueBackend};
use docbulk::domain::tasks::{TaskKind, TaskRequest};
use docbulk::infrastructure::pdf::LopdfEngine;
use docbulk::infrastructure::storage::FsStoragePort;
use docbulk::infrastructure::tasks::BroadcastTaskQueue;

use common::{Harness, page_count};

fn request(documents: Vec<i64>, method: &str, parameters: serde_json::Value) -> BulkEditRequest {
    BulkEditRequest {
        documents,
        method: method.into(),
        parameters,
    }
}

#[tokio::test]
async fn dispatches_split_with_page_string() {
    let mut h = Harness::new().await;
    let doc = h.add_pdf("Report", 3, false).await;

    let status = ExecuteBulkEdit {
        documents: &h.store,
        access: &h.store,
        users: &h.store,
        storage: &h.storage,
        pdf: &h.pdf,
        tasks: &h.tasks,
    }
    .execute(request(vec![doc.id], "split", json!({"pages": "1-2,3"})))
    .await
    .unwrap();
    assert_eq!(status, OK);

    let titles: Vec<String> = h
        .drain_tasks()
        .into_iter()
        .filter_map(|t| match t.kind {
            TaskKind::ConsumeFile { overrides, .. } => overrides.title,
            _ => None,
        })
        .collect();
    assert_eq!(titles, vec!["Report (split 1)", "Report (split 2)"]);
}

#[tokio::test]
async fn rejects_unknown_methods() {
    let h = Harness::new().await;
    let doc = h.add_pdf("Report", 1, false).await;
    let result = ExecuteBulkEdit {
        documents: &h.store,
        access: &h.store,
        users: &h.store,
        storage: &h.storage,
        pdf: &h.pdf,
        tasks: &h.tasks,
    }
    .execute(request(vec![doc.id], "shred", json!({})))
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn app_context_runs_requests_and_streams_tasks() {
    let h = Harness::new().await;
    let a = h.add_pdf("A", 2, false).await;
    let b = h.add_pdf("B", 1, true).await;

    let (tx, _) = tokio::sync::broadcast::channel::<TaskRequest>(16);
    let services = AppServices::new(
        Arc::new(h.store.clone()),
        Arc::new(h.store.clone()),
        Arc::new(h.store.clone()),
        Arc::new(FsStoragePort::new(&h.dirs.dirs)),
        Arc::new(LopdfEngine::new()),
        Arc::new(BroadcastTaskQueue::new(tx.clone())),
    )
    .with_task_events(tx);
    let cfg = Config {
        database_url: "postgres://unused".into(),
        storage: h.dirs.dirs.clone(),
        task_queue_backend: TaskQueueBackend::InProcess,
        task_channel: "tasks".into(),
        bulk_edit_channel: "bulk_edit".into(),
    };
    let ctx = AppContext::new(cfg, services);
    let mut stream = ctx.subscribe_tasks();

    let status = ctx
        .bulk_edit(request(
            vec![b.id, a.id],
            "merge",
            json!({"metadata_document_id": b.id}),
        ))
        .await
        .unwrap();
    assert_eq!(status, OK);

    let task = stream.next().await.unwrap();
    match task.kind {
        TaskKind::ConsumeFile { input, overrides } => {
            assert_eq!(input.original_file.file_name().unwrap(), "2_1_merged.pdf");
            assert_eq!(overrides.title.as_deref(), Some("B (merged)"));
            assert_eq!(page_count(&input.original_file), 3);
        }
        other => panic!("unexpected task {other:?}"),
    }
}
