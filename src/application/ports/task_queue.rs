use async_trait::async_trait;

use crate::domain::tasks::TaskRequest;

/// Fire-and-forget submission of background work. Implementations must not
/// wait for the task to run.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn submit(&self, task: TaskRequest) -> anyhow::Result<()>;
}
