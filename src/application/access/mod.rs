use std::collections::BTreeSet;

use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::user_repository::UserRepository;
use crate::domain::documents::permissions::{
    Capability, PermissionGrant, SetPermissions, Subject, SubjectSet,
};

// Grant bookkeeping shared by the bulk edit operations. Ownership lives on the
// document record; everything else is a (subject, document, capability) row.

/// Distinct users holding any capability on the document.
pub async fn users_with_perms<A>(access_repo: &A, doc_id: i64) -> anyhow::Result<Vec<i64>>
where
    A: AccessRepository + ?Sized,
{
    let grants = access_repo.grants_for_document(doc_id).await?;
    let users: BTreeSet<i64> = grants
        .iter()
        .filter_map(|g| match g.subject {
            Subject::User(id) => Some(id),
            Subject::Group(_) => None,
        })
        .collect();
    Ok(users.into_iter().collect())
}

/// Distinct groups holding any capability on the document.
pub async fn groups_with_perms<A>(access_repo: &A, doc_id: i64) -> anyhow::Result<Vec<i64>>
where
    A: AccessRepository + ?Sized,
{
    let grants = access_repo.grants_for_document(doc_id).await?;
    let groups: BTreeSet<i64> = grants
        .iter()
        .filter_map(|g| match g.subject {
            Subject::Group(id) => Some(id),
            Subject::User(_) => None,
        })
        .collect();
    Ok(groups.into_iter().collect())
}

/// Subjects holding exactly `capability` on the document.
pub async fn subjects_with_capability<A>(
    access_repo: &A,
    doc_id: i64,
    capability: Capability,
) -> anyhow::Result<BTreeSet<Subject>>
where
    A: AccessRepository + ?Sized,
{
    let grants = access_repo.grants_for_document(doc_id).await?;
    Ok(grants
        .into_iter()
        .filter(|g| g.capability == capability)
        .map(|g| g.subject)
        .collect())
}

/// Resolves requested ids against existing principals, dropping unknown ones.
pub async fn resolve_subjects<U>(users_repo: &U, requested: &SubjectSet) -> anyhow::Result<BTreeSet<Subject>>
where
    U: UserRepository + ?Sized,
{
    let mut subjects = BTreeSet::new();
    if !requested.users.is_empty() {
        for id in users_repo.existing_user_ids(&requested.users).await? {
            subjects.insert(Subject::User(id));
        }
    }
    if !requested.groups.is_empty() {
        for id in users_repo.existing_group_ids(&requested.groups).await? {
            subjects.insert(Subject::Group(id));
        }
    }
    Ok(subjects)
}

/// Applies `requested` to a single document.
///
/// With `merge == false` the grant set of every capability present in
/// `requested` becomes exactly the requested set; with `merge == true` the
/// requested subjects are added to whatever is already granted. Capabilities
/// absent from `requested` are never touched.
pub async fn set_permissions_for_document<A, U>(
    access_repo: &A,
    users_repo: &U,
    doc_id: i64,
    requested: &SetPermissions,
    merge: bool,
) -> anyhow::Result<()>
where
    A: AccessRepository + ?Sized,
    U: UserRepository + ?Sized,
{
    for capability in Capability::ALL {
        let Some(set) = requested.get(capability) else {
            continue;
        };
        let wanted = resolve_subjects(users_repo, set).await?;

        if !merge {
            let current = subjects_with_capability(access_repo, doc_id, capability).await?;
            for subject in current.difference(&wanted) {
                access_repo
                    .revoke(&PermissionGrant {
                        document_id: doc_id,
                        subject: *subject,
                        capability,
                    })
                    .await?;
            }
        }

        for subject in &wanted {
            access_repo
                .assign(&PermissionGrant {
                    document_id: doc_id,
                    subject: *subject,
                    capability,
                })
                .await?;
        }
    }
    Ok(())
}
