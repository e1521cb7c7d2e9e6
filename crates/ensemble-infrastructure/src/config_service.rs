//! Configuration service implementation.
//!
//! Loads `EnsembleConfig` from `config.toml` and caches it.

use crate::paths::EnsemblePaths;
use ensemble_core::config::EnsembleConfig;
use ensemble_core::error::{EnsembleError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Reads a configuration file.
///
/// A missing or empty file yields the defaults; a file that exists but does
/// not parse is a `Config` error.
pub fn load_config_file(path: &Path) -> Result<EnsembleConfig> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("[ConfigService] No config at {:?}, using defaults", path);
            return Ok(EnsembleConfig::default());
        }
        Err(e) => return Err(e.into()),
    };

    if content.trim().is_empty() {
        return Ok(EnsembleConfig::default());
    }

    toml::from_str(&content)
        .map_err(|e| EnsembleError::config(format!("Failed to parse {:?}: {}", path, e)))
}

/// Configuration service that loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    paths: EnsemblePaths,
    /// Cached configuration, loaded lazily.
    config: Arc<RwLock<Option<EnsembleConfig>>>,
}

impl ConfigService {
    pub fn new(paths: EnsemblePaths) -> Self {
        Self {
            paths,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<EnsembleConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = read_lock.as_ref() {
                return Ok(cached.clone());
            }
        }

        let loaded = load_config_file(&self.paths.config_file()?)?;

        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = None;
    }

    /// Registry root: the configured one, else the default sessions dir.
    pub fn registry_root(&self, config: &EnsembleConfig) -> Result<PathBuf> {
        match &config.registry_root {
            Some(root) => Ok(root.clone()),
            None => Ok(self.paths.sessions_dir()?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(EnsemblePaths::new(Some(temp_dir.path())));
        let config = service.get_config().unwrap();
        assert_eq!(config, EnsembleConfig::default());
        assert_eq!(
            service.registry_root(&config).unwrap(),
            temp_dir.path().join("sessions")
        );
    }

    #[test]
    fn test_loads_and_caches() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "shared_dir_name = \"common\"\nregistry_root = \"/var/team\"\n").unwrap();

        let service = ConfigService::new(EnsemblePaths::new(Some(temp_dir.path())));
        let config = service.get_config().unwrap();
        assert_eq!(config.shared_dir_name, "common");
        assert_eq!(service.registry_root(&config).unwrap(), PathBuf::from("/var/team"));

        fs::write(&config_path, "shared_dir_name = \"other\"\n").unwrap();
        assert_eq!(service.get_config().unwrap().shared_dir_name, "common");

        service.invalidate_cache();
        assert_eq!(service.get_config().unwrap().shared_dir_name, "other");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "singleton_personas = [").unwrap();

        let err = load_config_file(&config_path).unwrap_err();
        assert!(matches!(err, EnsembleError::Config(_)));
    }
}
