//! preptrack-core - Core library for Preptrack
//!
//! This crate contains the shared models, local store, entity repository,
//! merge engine and sync orchestrator used by the Preptrack interfaces.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod merge;
pub mod models;
pub mod remote;
pub mod repository;
pub mod services;
pub mod state;
pub mod stats;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Application, PracticeLog, RecordId, Settings, Snapshot, Topic};
pub use services::TrackerService;
pub use state::SyncStatus;
pub use sync::{SyncError, SyncOrchestrator};
