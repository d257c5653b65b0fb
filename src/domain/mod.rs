pub mod documents;
pub mod tasks;
