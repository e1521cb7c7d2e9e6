//! Filesystem adapters for Ensemble.
//!
//! The registry root is the database: one directory per session holding
//! TOML records and plain-text mailbox and task files.

pub mod config_service;
pub mod paths;
pub mod session_registry;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::paths::EnsemblePaths;
pub use crate::session_registry::{SessionRegistry, SpawnRequest, TeamCost, UpdateCheck};
