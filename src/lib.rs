#![allow(clippy::uninlined_format_args)]
pub mod config;
pub mod connector;
pub mod context;
pub mod logger;
pub mod mongo;
pub mod rdd;
pub mod util;
