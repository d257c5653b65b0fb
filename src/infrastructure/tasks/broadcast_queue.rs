use async_trait::async_trait;

use crate::application::ports::task_queue::TaskQueue;
use crate::domain::tasks::TaskRequest;

/// Hands submitted tasks to in-process subscribers.
#[derive(Clone)]
pub struct BroadcastTaskQueue {
    sender: tokio::sync::broadcast::Sender<TaskRequest>,
}

impl BroadcastTaskQueue {
    pub fn new(sender: tokio::sync::broadcast::Sender<TaskRequest>) -> Self {
        Self { sender }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<TaskRequest> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl TaskQueue for BroadcastTaskQueue {
    async fn submit(&self, task: TaskRequest) -> anyhow::Result<()> {
        tracing::debug!(task_id = %task.id, task = task.kind.name(), "task_submitted");
        match self.sender.send(task) {
            Ok(_) => Ok(()),
            // No subscriber yet; the submission itself still succeeded.
            Err(tokio::sync::broadcast::error::SendError(_)) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submit_without_subscribers_is_ok() {
        let (tx, _) = tokio::sync::broadcast::channel(4);
        let queue = BroadcastTaskQueue::new(tx);
        queue
            .submit(TaskRequest::bulk_update_documents(vec![1]))
            .await
            .unwrap();

        let mut rx = queue.subscribe();
        queue
            .submit(TaskRequest::update_document_archive_file(2))
            .await
            .unwrap();
        let got = rx.recv().await.unwrap();
        assert_eq!(got.kind.name(), "update_document_archive_file");
    }
}
