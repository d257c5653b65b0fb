use tracing::debug;

use crate::application::dto::bulk_edit::{BulkEditCommand, BulkEditRequest};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::pdf_port::PdfEngine;
use crate::application::ports::storage_port::StoragePort;
use crate::application::ports::task_queue::TaskQueue;
use crate::application::ports::user_repository::UserRepository;
use crate::application::use_cases::bulk_edit::LOG_TARGET;
use crate::application::use_cases::bulk_edit::delete_pages::DeletePages;
use crate::application::use_cases::bulk_edit::merge::MergeDocuments;
use crate::application::use_cases::bulk_edit::rotate::RotateDocuments;
use crate::application::use_cases::bulk_edit::set_permissions::SetDocumentPermissions;
use crate::application::use_cases::bulk_edit::split::SplitDocument;

pub struct ExecuteBulkEdit<'a, D, A, U, S, P, Q>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    U: UserRepository + ?Sized,
    S: StoragePort + ?Sized,
    P: PdfEngine + ?Sized,
    Q: TaskQueue + ?Sized,
{
    pub documents: &'a D,
    pub access: &'a A,
    pub users: &'a U,
    pub storage: &'a S,
    pub pdf: &'a P,
    pub tasks: &'a Q,
}

impl<'a, D, A, U, S, P, Q> ExecuteBulkEdit<'a, D, A, U, S, P, Q>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    U: UserRepository + ?Sized,
    S: StoragePort + ?Sized,
    P: PdfEngine + ?Sized,
    Q: TaskQueue + ?Sized,
{
    pub async fn execute(&self, request: BulkEditRequest) -> anyhow::Result<&'static str> {
        let doc_ids = request.documents.clone();
        let command = request.into_command()?;
        debug!(target: LOG_TARGET, ?command, documents = ?doc_ids, "bulk_edit_dispatch");
        self.run(&doc_ids, command).await
    }

    pub async fn run(&self, doc_ids: &[i64], command: BulkEditCommand) -> anyhow::Result<&'static str> {
        match command {
            BulkEditCommand::SetPermissions {
                set_permissions,
                owner,
                merge,
            } => {
                SetDocumentPermissions {
                    documents: self.documents,
                    access: self.access,
                    users: self.users,
                    tasks: self.tasks,
                }
                .execute(doc_ids, &set_permissions, owner, merge)
                .await
            }
            BulkEditCommand::Merge {
                metadata_document_id,
            } => {
                MergeDocuments {
                    documents: self.documents,
                    access: self.access,
                    storage: self.storage,
                    pdf: self.pdf,
                    tasks: self.tasks,
                }
                .execute(doc_ids, metadata_document_id)
                .await
            }
            BulkEditCommand::Split { pages } => {
                SplitDocument {
                    documents: self.documents,
                    access: self.access,
                    storage: self.storage,
                    pdf: self.pdf,
                    tasks: self.tasks,
                }
                .execute(doc_ids, &pages)
                .await
            }
            BulkEditCommand::Rotate { degrees } => {
                RotateDocuments {
                    documents: self.documents,
                    storage: self.storage,
                    pdf: self.pdf,
                    tasks: self.tasks,
                }
                .execute(doc_ids, degrees)
                .await
            }
            BulkEditCommand::DeletePages { pages } => {
                DeletePages {
                    documents: self.documents,
                    storage: self.storage,
                    pdf: self.pdf,
                    tasks: self.tasks,
                }
                .execute(doc_ids, &pages)
                .await
            }
        }
    }
}
