use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::documents::permissions::SetPermissions;

/// Wire form of a bulk edit: the target documents, a method name and the
/// method's parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkEditRequest {
    pub documents: Vec<i64>,
    pub method: String,
    #[serde(default)]
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkEditCommand {
    SetPermissions {
        set_permissions: SetPermissions,
        owner: Option<i64>,
        merge: bool,
    },
    Merge {
        metadata_document_id: Option<i64>,
    },
    Split {
        pages: Vec<Vec<u32>>,
    },
    Rotate {
        degrees: i32,
    },
    DeletePages {
        pages: Vec<u32>,
    },
}

#[derive(Deserialize)]
struct SetPermissionsParams {
    #[serde(default)]
    set_permissions: SetPermissions,
    #[serde(default)]
    owner: Option<i64>,
    #[serde(default)]
    merge: bool,
}

#[derive(Deserialize)]
struct MergeParams {
    #[serde(default)]
    metadata_document_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageGroupsParam {
    Groups(Vec<Vec<u32>>),
    Ranges(String),
}

#[derive(Deserialize)]
struct SplitParams {
    pages: PageGroupsParam,
}

#[derive(Deserialize)]
struct RotateParams {
    degrees: i32,
}

#[derive(Deserialize)]
struct DeletePagesParams {
    pages: Vec<u32>,
}

impl BulkEditRequest {
    pub fn into_command(self) -> anyhow::Result<BulkEditCommand> {
        if self.documents.is_empty() {
            anyhow::bail!("no documents given");
        }
        let params = if self.parameters.is_null() {
            Value::Object(Default::default())
        } else {
            self.parameters
        };
        let command = match self.method.as_str() {
            "set_permissions" => {
                let p: SetPermissionsParams = serde_json::from_value(params)?;
                BulkEditCommand::SetPermissions {
                    set_permissions: p.set_permissions,
                    owner: p.owner,
                    merge: p.merge,
                }
            }
            "merge" => {
                let p: MergeParams = serde_json::from_value(params)?;
                BulkEditCommand::Merge {
                    metadata_document_id: p.metadata_document_id,
                }
            }
            "split" => {
                let p: SplitParams = serde_json::from_value(params)?;
                let pages = match p.pages {
                    PageGroupsParam::Groups(groups) => groups,
                    PageGroupsParam::Ranges(ranges) => parse_page_groups(&ranges)?,
                };
                let bad_group = |g: &Vec<u32>| g.is_empty() || !g.iter().copied().all(valid_page);
                if pages.is_empty() || pages.iter().any(bad_group) {
                    anyhow::bail!("invalid page groups");
                }
                BulkEditCommand::Split { pages }
            }
            "rotate" => {
                let p: RotateParams = serde_json::from_value(params)?;
                if p.degrees % 90 != 0 {
                    anyhow::bail!("degrees must be a multiple of 90");
                }
                BulkEditCommand::Rotate { degrees: p.degrees }
            }
            "delete_pages" => {
                let p: DeletePagesParams = serde_json::from_value(params)?;
                if p.pages.is_empty() || !p.pages.iter().copied().all(valid_page) {
                    anyhow::bail!("invalid pages");
                }
                BulkEditCommand::DeletePages { pages: p.pages }
            }
            other => anyhow::bail!("unsupported bulk edit method: {other}"),
        };
        Ok(command)
    }
}

/// Highest page number a request may name.
pub const MAX_PAGE_NUMBER: u32 = 100_000;

fn valid_page(page: u32) -> bool {
    (1..=MAX_PAGE_NUMBER).contains(&page)
}

/// Parses `"1-2,3,5-7"` into `[[1, 2], [3], [5, 6, 7]]`.
pub fn parse_page_groups(ranges: &str) -> anyhow::Result<Vec<Vec<u32>>> {
    let mut groups = Vec::new();
    for part in ranges.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let group = match part.split_once('-') {
            Some((start, end)) => {
                let start: u32 = start.trim().parse()?;
                let end: u32 = end.trim().parse()?;
                if !valid_page(start) || !valid_page(end) || end < start {
                    anyhow::bail!("invalid page range {part}");
                }
                (start..=end).collect()
            }
            None => {
                let page: u32 = part.parse()?;
                if !valid_page(page) {
                    anyhow::bail!("page {page} outside 1..={MAX_PAGE_NUMBER}");
                }
                vec![page]
            }
        };
        groups.push(group);
    }
    Ok(groups)
}
