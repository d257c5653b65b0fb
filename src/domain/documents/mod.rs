pub mod document;
pub mod overrides;
pub mod permissions;
