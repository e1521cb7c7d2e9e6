//! Domain layer for Ensemble: persona sessions coordinated through a shared
//! directory tree.
//!
//! This crate holds the models and pure policies. Filesystem access lives in
//! `ensemble-infrastructure`.

pub mod config;
pub mod error;
pub mod persona;
pub mod session;
pub mod usage;

// Re-export common error type
pub use error::{EnsembleError, Result};
