pub mod common;
pub mod frame;
pub mod slice;
