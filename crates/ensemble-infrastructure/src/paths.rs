//! Unified path management for ensemble configuration and session data.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/ensemble/          # Config directory
//! └── config.toml              # EnsembleConfig
//!
//! ~/.local/share/ensemble/     # Data directory
//! └── sessions/                # Default registry root
//!     ├── shared/              # Reserved shared storage, never a session
//!     ├── developer-1717171717171/
//!     ├── tester-request-login-tests/
//!     └── developer-1717000000000-archived/
//! ```
//!
//! Setting `ENSEMBLE_HOME` relocates both directories under one root, which
//! is how test harnesses and sandboxed workers isolate themselves.

use std::path::{Path, PathBuf};

/// Environment variable overriding the base directory.
pub const ENSEMBLE_HOME_ENV: &str = "ENSEMBLE_HOME";

const APP_DIR: &str = "ensemble";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for ensemble_core::EnsembleError {
    fn from(err: PathError) -> Self {
        ensemble_core::EnsembleError::config(err.to_string())
    }
}

/// Path resolution, optionally rooted at an explicit base directory.
#[derive(Debug, Clone)]
pub struct EnsemblePaths {
    base_dir: Option<PathBuf>,
}

impl EnsemblePaths {
    /// Uses `base_dir` when given, else `ENSEMBLE_HOME`, else platform dirs.
    pub fn new(base_dir: Option<&Path>) -> Self {
        let base_dir = base_dir.map(Path::to_path_buf).or_else(|| {
            std::env::var_os(ENSEMBLE_HOME_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        });
        Self { base_dir }
    }

    /// Returns the configuration directory (e.g. `~/.config/ensemble/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base_dir {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    /// Returns the data directory (e.g. `~/.local/share/ensemble/`).
    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base_dir {
            Some(base) => Ok(base.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Default registry root when the configuration does not name one.
    pub fn sessions_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("sessions"))
    }
}
