use serde::{Deserialize, Serialize};

use crate::domain::documents::document::Document;
use crate::domain::documents::permissions::{Capability, PermissionGrant, Subject};

/// Metadata applied to a file when it is consumed, replacing whatever the
/// consumer would otherwise derive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadataOverrides {
    pub title: Option<String>,
    pub correspondent_id: Option<i64>,
    pub document_type_id: Option<i64>,
    pub storage_path_id: Option<i64>,
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    #[serde(default)]
    pub view_users: Vec<i64>,
    #[serde(default)]
    pub view_groups: Vec<i64>,
    #[serde(default)]
    pub change_users: Vec<i64>,
    #[serde(default)]
    pub change_groups: Vec<i64>,
}

impl DocumentMetadataOverrides {
    pub fn from_document(doc: &Document, grants: &[PermissionGrant]) -> Self {
        let mut overrides = Self {
            title: Some(doc.title.clone()),
            correspondent_id: doc.correspondent_id,
            document_type_id: doc.document_type_id,
            storage_path_id: doc.storage_path_id,
            owner_id: doc.owner_id,
            tag_ids: doc.tag_ids.clone(),
            ..Self::default()
        };
        for grant in grants.iter().filter(|g| g.document_id == doc.id) {
            let bucket = match (grant.capability, grant.subject) {
                (Capability::View, Subject::User(id)) => (&mut overrides.view_users, id),
                (Capability::View, Subject::Group(id)) => (&mut overrides.view_groups, id),
                (Capability::Change, Subject::User(id)) => (&mut overrides.change_users, id),
                (Capability::Change, Subject::Group(id)) => (&mut overrides.change_groups, id),
            };
            if !bucket.0.contains(&bucket.1) {
                bucket.0.push(bucket.1);
            }
        }
        overrides
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}
