mod storage_port_impl;
pub use storage_port_impl::*;
