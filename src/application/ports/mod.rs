pub mod access_repository;
pub mod document_repository;
pub mod pdf_port;
pub mod storage_port;
pub mod task_queue;
pub mod user_repository;
