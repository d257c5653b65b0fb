mod common;

use std::path::PathBuf;

use docbulk::application::ports::document_repository::DocumentRepository;
use docbulk::application::ports::storage_port::StoragePort;
use docbulk::application::use_cases::bulk_edit::OK;
use docbulk::application::use_cases::bulk_edit::delete_pages::DeletePages;
use docbulk::application::use_cases::bulk_edit::merge::MergeDocuments;
use docbulk::application::use_cases::bulk_edit::rotate::RotateDocuments;
use docbulk::application::use_cases::bulk_edit::split::SplitDocument;
use docbulk::domain::documents::document::NewDocument;
use docbulk::domain::documents::overrides::DocumentMetadataOverrides;
use docbulk::domain::tasks::{TaskKind, TaskRequest};

use docbulk::infrastructure::memory::InMemoryStore;
use docbulk::infrastructure::storage::FsStoragePort;
use docbulk::infrastructure::tasks::BroadcastTaskQueue;

use common::{FlakyPdfEngine, Harness, LogCapture, page_count, page_rotations};

fn consumed(task: &TaskRequest) -> (PathBuf, DocumentMetadataOverrides) {
    match &task.kind {
        TaskKind::ConsumeFile { input, overrides } => {
            (input.original_file.clone(), overrides.clone())
        }
        other => panic!("expected a consume task, got {other:?}"),
    }
}

async fn three_documents(h: &Harness) -> Vec<i64> {
    vec![
        h.add_pdf("A", 1, false).await.id,
        h.add_pdf("B", 2, true).await.id,
        h.add_pdf("C", 3, false).await.id,
    ]
}

type Merge<'a> =
    MergeDocuments<'a, InMemoryStore, InMemoryStore, FsStoragePort, FlakyPdfEngine, BroadcastTaskQueue>;

fn merge(h: &Harness) -> Merge<'_> {
    MergeDocuments {
        documents: &h.store,
        access: &h.store,
        storage: &h.storage,
        pdf: &h.pdf,
        tasks: &h.tasks,
    }
}

#[tokio::test]
async fn merge_concatenates_in_id_order() {
    let mut h = Harness::new().await;
    let ids = three_documents(&h).await;

    assert_eq!(merge(&h).execute(&ids, None).await.unwrap(), OK);

    let tasks = h.drain_tasks();
    assert_eq!(tasks.len(), 1);
    let (file, overrides) = consumed(&tasks[0]);
    assert_eq!(file.file_name().unwrap(), "1_2_3_merged.pdf");
    assert_eq!(file.parent().unwrap(), h.storage.scratch_dir());
    assert_eq!(overrides.title, None);
    assert_eq!(page_count(&file), 6);
}

#[tokio::test]
async fn merge_takes_metadata_from_chosen_document() {
    let mut h = Harness::new().await;
    let ids = three_documents(&h).await;

    merge(&h).execute(&ids, Some(ids[0])).await.unwrap();

    let tasks = h.drain_tasks();
    assert_eq!(tasks.len(), 1);
    let (_, overrides) = consumed(&tasks[0]);
    assert_eq!(overrides.title.as_deref(), Some("A (merged)"));
}

#[tokio::test]
async fn merge_skips_unreadable_documents() {
    let mut h = Harness::new().await;
    let ids = three_documents(&h).await;
    let b = h.store.get_by_id(ids[1]).await.unwrap().unwrap();
    h.pdf.fail_open_of(h.storage.archive_path(&b).unwrap());

    let (logs, _guard) = LogCapture::install();
    assert_eq!(merge(&h).execute(&ids, None).await.unwrap(), OK);

    let errors = logs.error_lines();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Error merging document 2, it will not be included in the merge"));

    let tasks = h.drain_tasks();
    assert_eq!(tasks.len(), 1);
    let (file, _) = consumed(&tasks[0]);
    assert_eq!(page_count(&file), 4);
}

#[tokio::test]
async fn merge_with_nothing_readable_submits_nothing() {
    let mut h = Harness::new().await;
    let a = h.add_pdf("A", 1, false).await;
    h.pdf.fail_open_of(h.storage.source_path(&a));

    let (logs, _guard) = LogCapture::install();
    assert_eq!(merge(&h).execute(&[a.id], None).await.unwrap(), OK);
    assert!(logs.contents().contains("No documents were merged"));
    assert!(h.drain_tasks().is_empty());
}

#[tokio::test]
async fn merge_logs_each_unreadable_document_and_submits_nothing() {
    let mut h = Harness::new().await;
    let ids = three_documents(&h).await;
    let b = h.store.get_by_id(ids[1]).await.unwrap().unwrap();
    let c = h.store.get_by_id(ids[2]).await.unwrap().unwrap();
    h.pdf.fail_open_of(h.storage.archive_path(&b).unwrap());
    h.pdf.fail_open_of(h.storage.source_path(&c));

    let (logs, _guard) = LogCapture::install();
    assert_eq!(merge(&h).execute(&ids[1..], None).await.unwrap(), OK);

    let errors = logs.error_lines();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("Error merging document 2, it will not be included in the merge"));
    assert!(errors[1].contains("Error merging document 3, it will not be included in the merge"));
    assert!(logs.contents().contains("No documents were merged"));
    assert!(h.drain_tasks().is_empty());
    assert!(!h.storage.scratch_dir().join("2_3_merged.pdf").exists());
}

#[tokio::test]
async fn split_submits_one_task_per_group() {
    let mut h = Harness::new().await;
    let ids = three_documents(&h).await;

    let status = SplitDocument {
        documents: &h.store,
        access: &h.store,
        storage: &h.storage,
        pdf: &h.pdf,
        tasks: &h.tasks,
    }
    .execute(&ids[2..], &[vec![1, 2], vec![3]])
    .await
    .unwrap();
    assert_eq!(status, OK);

    let tasks = h.drain_tasks();
    assert_eq!(tasks.len(), 2);
    let (first, first_meta) = consumed(&tasks[0]);
    let (second, second_meta) = consumed(&tasks[1]);
    assert_eq!(first.file_name().unwrap(), "3_1_1-2.pdf");
    assert_eq!(second.file_name().unwrap(), "3_2_3-3.pdf");
    assert_eq!(first_meta.title.as_deref(), Some("C (split 1)"));
    assert_eq!(second_meta.title.as_deref(), Some("C (split 2)"));
    assert_eq!(page_count(&first), 2);
    assert_eq!(page_count(&second), 1);
}

#[tokio::test]
async fn split_groups_with_same_bounds_get_their_own_files() {
    let mut h = Harness::new().await;
    let ids = three_documents(&h).await;

    SplitDocument {
        documents: &h.store,
        access: &h.store,
        storage: &h.storage,
        pdf: &h.pdf,
        tasks: &h.tasks,
    }
    .execute(&ids[2..], &[vec![1, 3], vec![1, 2, 3]])
    .await
    .unwrap();

    let tasks = h.drain_tasks();
    assert_eq!(tasks.len(), 2);
    let (first, _) = consumed(&tasks[0]);
    let (second, _) = consumed(&tasks[1]);
    assert_ne!(first, second);
    assert_eq!(page_count(&first), 2);
    assert_eq!(page_count(&second), 3);
}

#[tokio::test]
async fn split_save_failure_submits_nothing() {
    let mut h = Harness::new().await;
    let ids = three_documents(&h).await;
    h.pdf.fail_every_save();

    let (logs, _guard) = LogCapture::install();
    let status = SplitDocument {
        documents: &h.store,
        access: &h.store,
        storage: &h.storage,
        pdf: &h.pdf,
        tasks: &h.tasks,
    }
    .execute(&ids[1..2], &[vec![1], vec![2]])
    .await
    .unwrap();
    assert_eq!(status, OK);

    let errors = logs.error_lines();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Error splitting document 2"));
    assert!(h.drain_tasks().is_empty());
}

#[tokio::test]
async fn rotate_updates_files_and_queues_tasks() {
    let mut h = Harness::new().await;
    let ids = three_documents(&h).await;
    let before = h.store.get_by_id(ids[1]).await.unwrap().unwrap();

    let status = RotateDocuments {
        documents: &h.store,
        storage: &h.storage,
        pdf: &h.pdf,
        tasks: &h.tasks,
    }
    .execute(&ids[1..], 90)
    .await
    .unwrap();
    assert_eq!(status, OK);

    let tasks = h.drain_tasks();
    assert_eq!(tasks.len(), 3);
    assert_eq!(
        tasks[0].kind,
        TaskKind::UpdateDocumentArchiveFile {
            document_id: ids[1]
        }
    );
    assert_eq!(
        tasks[1].kind,
        TaskKind::UpdateDocumentArchiveFile {
            document_id: ids[2]
        }
    );
    assert_eq!(
        tasks[2].kind,
        TaskKind::BulkUpdateDocuments {
            document_ids: ids[1..].to_vec()
        }
    );

    let after = h.store.get_by_id(ids[1]).await.unwrap().unwrap();
    assert_eq!(page_rotations(&h.storage.source_path(&after)), vec![90, 90]);
    assert_eq!(
        page_rotations(&h.storage.archive_path(&after).unwrap()),
        vec![90, 90]
    );
    assert_ne!(after.checksum, before.checksum);
    assert_ne!(after.archive_checksum, before.archive_checksum);
}

#[tokio::test]
async fn rotate_skips_non_pdf_documents() {
    let mut h = Harness::new().await;
    let a = h.add_pdf("A", 1, false).await;
    let mut image = NewDocument::new("img", "Scan");
    image.mime_type = "image/png".into();
    let image = h.store.create(&image).await.unwrap();

    let (logs, _guard) = LogCapture::install();
    RotateDocuments {
        documents: &h.store,
        storage: &h.storage,
        pdf: &h.pdf,
        tasks: &h.tasks,
    }
    .execute(&[a.id, image.id], -90)
    .await
    .unwrap();

    assert!(logs.contents().contains("is not a PDF, skipping rotation"));
    let tasks = h.drain_tasks();
    assert_eq!(tasks.len(), 2);
    assert_eq!(
        tasks[1].kind,
        TaskKind::BulkUpdateDocuments {
            document_ids: vec![a.id]
        }
    );
    assert_eq!(page_rotations(&h.storage.source_path(&a)), vec![270]);
}

#[tokio::test]
async fn rotate_failures_queue_nothing() {
    let mut h = Harness::new().await;
    let ids = three_documents(&h).await;
    h.pdf.fail_every_save();

    let (logs, _guard) = LogCapture::install();
    let status = RotateDocuments {
        documents: &h.store,
        storage: &h.storage,
        pdf: &h.pdf,
        tasks: &h.tasks,
    }
    .execute(&ids[1..], 90)
    .await
    .unwrap();
    assert_eq!(status, OK);

    let errors = logs.error_lines();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("Error rotating document 2"));
    assert!(errors[1].contains("Error rotating document 3"));
    assert!(h.drain_tasks().is_empty());
}

#[tokio::test]
async fn rotate_reports_only_the_documents_that_changed() {
    let mut h = Harness::new().await;
    let ids = three_documents(&h).await;
    let c = h.store.get_by_id(ids[2]).await.unwrap().unwrap();
    h.pdf.fail_open_of(h.storage.source_path(&c));

    let (logs, _guard) = LogCapture::install();
    let status = RotateDocuments {
        documents: &h.store,
        storage: &h.storage,
        pdf: &h.pdf,
        tasks: &h.tasks,
    }
    .execute(&ids[1..], 180)
    .await
    .unwrap();
    assert_eq!(status, OK);

    let errors = logs.error_lines();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Error rotating document 3"));

    let tasks = h.drain_tasks();
    assert_eq!(tasks.len(), 2);
    assert_eq!(
        tasks[0].kind,
        TaskKind::UpdateDocumentArchiveFile {
            document_id: ids[1]
        }
    );
    assert_eq!(
        tasks[1].kind,
        TaskKind::BulkUpdateDocuments {
            document_ids: vec![ids[1]]
        }
    );

    let b = h.store.get_by_id(ids[1]).await.unwrap().unwrap();
    assert_eq!(page_rotations(&h.storage.source_path(&b)), vec![180, 180]);
    assert_eq!(page_rotations(&h.storage.source_path(&c)), vec![0, 0, 0]);
    assert_eq!(h.store.get_by_id(ids[2]).await.unwrap().unwrap().checksum, c.checksum);
}

#[tokio::test]
async fn rotate_rejects_odd_angles() {
    let h = Harness::new().await;
    let a = h.add_pdf("A", 1, false).await;
    let result = RotateDocuments {
        documents: &h.store,
        storage: &h.storage,
        pdf: &h.pdf,
        tasks: &h.tasks,
    }
    .execute(&[a.id], 45)
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn delete_pages_rewrites_the_original() {
    let mut h = Harness::new().await;
    let ids = three_documents(&h).await;

    let status = DeletePages {
        documents: &h.store,
        storage: &h.storage,
        pdf: &h.pdf,
        tasks: &h.tasks,
    }
    .execute(&ids[2..], &[2, 2])
    .await
    .unwrap();
    assert_eq!(status, OK);

    let doc = h.store.get_by_id(ids[2]).await.unwrap().unwrap();
    assert_eq!(doc.page_count, Some(2));
    assert_eq!(page_count(&h.storage.source_path(&doc)), 2);
    let tasks = h.drain_tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(
        tasks[0].kind,
        TaskKind::UpdateDocumentArchiveFile {
            document_id: ids[2]
        }
    );
}

#[tokio::test]
async fn delete_pages_out_of_range_is_logged() {
    let mut h = Harness::new().await;
    let a = h.add_pdf("A", 1, false).await;

    let (logs, _guard) = LogCapture::install();
    let status = DeletePages {
        documents: &h.store,
        storage: &h.storage,
        pdf: &h.pdf,
        tasks: &h.tasks,
    }
    .execute(&[a.id], &[1])
    .await
    .unwrap();
    assert_eq!(status, OK);
    assert!(logs.error_lines()[0].contains("Error deleting pages from document 1"));
    assert!(h.drain_tasks().is_empty());
    assert_eq!(page_count(&h.storage.source_path(&a)), 1);
}
