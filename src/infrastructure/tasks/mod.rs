mod broadcast_queue;
mod pg_queue;

pub use broadcast_queue::*;
pub use pg_queue::*;
