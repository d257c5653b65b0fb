use std::sync::Arc;

use futures_util::{StreamExt, stream::BoxStream};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::application::dto::bulk_edit::BulkEditRequest;
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::pdf_port::PdfEngine;
use crate::application::ports::storage_port::StoragePort;
use crate::application::ports::task_queue::TaskQueue;
use crate::application::ports::user_repository::UserRepository;
use crate::application::use_cases::bulk_edit::dispatch::ExecuteBulkEdit;
use crate::bootstrap::config::Config;
use crate::domain::tasks::TaskRequest;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

#[derive(Clone)]
pub struct AppServices {
    document_repo: Arc<dyn DocumentRepository>,
    access_repo: Arc<dyn AccessRepository>,
    user_repo: Arc<dyn UserRepository>,
    storage_port: Arc<dyn StoragePort>,
    pdf_engine: Arc<dyn PdfEngine>,
    task_queue: Arc<dyn TaskQueue>,
    // Present only with the in-process task queue
    task_events: Option<broadcast::Sender<TaskRequest>>,
}

impl AppServices {
    pub fn new(
        document_repo: Arc<dyn DocumentRepository>,
        access_repo: Arc<dyn AccessRepository>,
        user_repo: Arc<dyn UserRepository>,
        storage_port: Arc<dyn StoragePort>,
        pdf_engine: Arc<dyn PdfEngine>,
        task_queue: Arc<dyn TaskQueue>,
    ) -> Self {
        Self {
            document_repo,
            access_repo,
            user_repo,
            storage_port,
            pdf_engine,
            task_queue,
            task_events: None,
        }
    }

    pub fn with_task_events(mut self, sender: broadcast::Sender<TaskRequest>) -> Self {
        self.task_events = Some(sender);
        self
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn document_repo(&self) -> Arc<dyn DocumentRepository> {
        self.services.document_repo.clone()
    }

    pub fn access_repo(&self) -> Arc<dyn AccessRepository> {
        self.services.access_repo.clone()
    }

    pub fn user_repo(&self) -> Arc<dyn UserRepository> {
        self.services.user_repo.clone()
    }

    pub fn storage_port(&self) -> Arc<dyn StoragePort> {
        self.services.storage_port.clone()
    }

    pub fn pdf_engine(&self) -> Arc<dyn PdfEngine> {
        self.services.pdf_engine.clone()
    }

    pub fn task_queue(&self) -> Arc<dyn TaskQueue> {
        self.services.task_queue.clone()
    }

    /// Tasks submitted through the in-process queue. Empty when tasks go to
    /// Postgres instead.
    pub fn subscribe_tasks(&self) -> BoxStream<'static, TaskRequest> {
        match &self.services.task_events {
            Some(sender) => BroadcastStream::new(sender.subscribe())
                .filter_map(|evt| async move { evt.ok() })
                .boxed(),
            None => futures_util::stream::empty().boxed(),
        }
    }

    pub async fn bulk_edit(&self, request: BulkEditRequest) -> anyhow::Result<&'static str> {
        let services = &self.services;
        ExecuteBulkEdit {
            documents: services.document_repo.as_ref(),
            access: services.access_repo.as_ref(),
            users: services.user_repo.as_ref(),
            storage: services.storage_port.as_ref(),
            pdf: services.pdf_engine.as_ref(),
            tasks: services.task_queue.as_ref(),
        }
        .execute(request)
        .await
    }
}
