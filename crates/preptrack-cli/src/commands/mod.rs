pub mod app;
pub mod common;
pub mod completions;
pub mod config;
pub mod export;
pub mod log;
pub mod settings;
pub mod stats;
pub mod sync;
pub mod topic;
