use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    View,
    Change,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::View, Capability::Change];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::View => "view",
            Capability::Change => "change",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "view" => Some(Capability::View),
            "change" => Some(Capability::Change),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
    User(i64),
    Group(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PermissionGrant {
    pub document_id: i64,
    pub subject: Subject,
    pub capability: Capability,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSet {
    #[serde(default)]
    pub users: Vec<i64>,
    #[serde(default)]
    pub groups: Vec<i64>,
}

/// Requested grants keyed by capability. A missing entry leaves that
/// capability untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPermissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<SubjectSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<SubjectSet>,
}

impl SetPermissions {
    pub fn get(&self, capability: Capability) -> Option<&SubjectSet> {
        match capability {
            Capability::View => self.view.as_ref(),
            Capability::Change => self.change.as_ref(),
        }
    }
}
