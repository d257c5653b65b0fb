use tracing::{info, warn};

use crate::application::access;
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::task_queue::TaskQueue;
use crate::application::ports::user_repository::UserRepository;
use crate::application::use_cases::bulk_edit::{LOG_TARGET, OK};
use crate::domain::documents::permissions::SetPermissions;
use crate::domain::tasks::TaskRequest;

pub struct SetDocumentPermissions<'a, D, A, U, Q>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    U: UserRepository + ?Sized,
    Q: TaskQueue + ?Sized,
{
    pub documents: &'a D,
    pub access: &'a A,
    pub users: &'a U,
    pub tasks: &'a Q,
}

impl<'a, D, A, U, Q> SetDocumentPermissions<'a, D, A, U, Q>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
    U: UserRepository + ?Sized,
    Q: TaskQueue + ?Sized,
{
    // merge == false: owner is overwritten and each requested capability is
    // replaced. merge == true: owner only fills empty slots, grants are added.
    pub async fn execute(
        &self,
        doc_ids: &[i64],
        set_permissions: &SetPermissions,
        owner: Option<i64>,
        merge: bool,
    ) -> anyhow::Result<&'static str> {
        let docs = self.documents.get_many(doc_ids).await?;
        let affected: Vec<i64> = docs.iter().map(|d| d.id).collect();

        let changed = self.documents.set_owner(&affected, owner, merge).await?;
        info!(
            target: LOG_TARGET,
            documents = affected.len(),
            owners_changed = changed,
            merge,
            "Setting permissions"
        );

        for doc_id in &affected {
            access::set_permissions_for_document(
                self.access,
                self.users,
                *doc_id,
                set_permissions,
                merge,
            )
            .await?;
        }

        if affected.is_empty() {
            warn!(target: LOG_TARGET, requested = doc_ids.len(), "No documents found, nothing to update");
            return Ok(OK);
        }
        self.tasks
            .submit(TaskRequest::bulk_update_documents(affected))
            .await?;
        Ok(OK)
    }
}
