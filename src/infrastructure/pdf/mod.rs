mod lopdf_engine;
pub use lopdf_engine::*;
