pub mod conf;
pub mod engine;
pub mod master;
