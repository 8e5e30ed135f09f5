pub mod args;
pub mod common;
pub mod error;
pub mod tmp;
