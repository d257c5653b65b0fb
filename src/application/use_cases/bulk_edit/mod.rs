//! Batch operations over documents. Every operation tolerates per-document
//! PDF failures: they are logged under [`LOG_TARGET`] and the batch goes on.
//! Store and queue failures are returned to the caller.

pub mod delete_pages;
pub mod dispatch;
pub mod merge;
pub mod rotate;
pub mod set_permissions;
pub mod split;

/// Log target shared by all bulk edit operations.
pub const LOG_TARGET: &str = "docbulk::bulk_edit";

/// Status returned by every operation once the batch was attempted.
pub const OK: &str = "OK";
