pub mod db;
pub mod memory;
pub mod pdf;
pub mod storage;
pub mod tasks;
