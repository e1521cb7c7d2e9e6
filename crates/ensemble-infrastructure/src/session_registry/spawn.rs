//! Spawn requests.
//!
//! A request is a `<persona>-request-<suffix>/` directory holding a mailbox
//! with the first instructions for the worker to be spawned. An external
//! spawner picks it up, starts the worker and renames or removes the
//! directory; the registry only creates and lists requests.

use super::SessionRegistry;
use super::layout::{
    MAILBOX_FILE, parse_spawn_request_dir_name, spawn_request_dir_name, validate_session_id,
};
use super::mailbox::append_block;
use ensemble_core::error::{EnsembleError, Result};
use ensemble_core::persona::PersonaType;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// A pending spawn request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpawnRequest {
    pub persona_type: PersonaType,
    pub suffix: String,
    pub dir: PathBuf,
}

impl SessionRegistry {
    /// Creates (or adds to) the spawn request for `persona_type` and
    /// writes `text` from `from_id` into its mailbox.
    pub fn request_spawn(
        &self,
        persona_type: &PersonaType,
        suffix: &str,
        from_id: &str,
        text: &str,
    ) -> Result<SpawnRequest> {
        let suffix = suffix.trim();
        if suffix.is_empty() {
            return Err(EnsembleError::invalid_input("spawn request suffix must not be empty"));
        }
        let dir_name = spawn_request_dir_name(persona_type, suffix);
        validate_session_id(&dir_name)?;

        let dir = self.root.join(&dir_name);
        fs::create_dir_all(&dir)?;
        append_block(&dir.join(MAILBOX_FILE), from_id, text)?;

        tracing::info!("[SessionRegistry] Spawn requested: {}", dir_name);
        Ok(SpawnRequest {
            persona_type: persona_type.clone(),
            suffix: suffix.to_string(),
            dir,
        })
    }

    /// Pending spawn requests, sorted by directory name. Requests that
    /// vanish mid-scan are simply missing from the result.
    pub fn list_spawn_requests(&self) -> Vec<SpawnRequest> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };

        let mut requests: Vec<SpawnRequest> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let (persona_type, suffix) = parse_spawn_request_dir_name(&name)?;
                Some(SpawnRequest {
                    persona_type,
                    suffix,
                    dir: entry.path(),
                })
            })
            .collect();
        requests.sort_by(|a, b| a.dir.cmp(&b.dir));
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::registry;
    use super::*;
    use ensemble_core::session::mailbox::parse_entries;

    #[test]
    fn test_request_and_list() {
        let (registry, _temp_dir) = registry();
        let request = registry
            .request_spawn(&PersonaType::Tester, "login-flow", "orchestrator-1", "Cover the login flow")
            .unwrap();
        assert!(request.dir.ends_with("tester-request-login-flow"));

        let mailbox = fs::read_to_string(request.dir.join(MAILBOX_FILE)).unwrap();
        let entries = parse_entries(&mailbox);
        assert_eq!(entries[0].source, "orchestrator-1");
        assert_eq!(entries[0].body, "Cover the login flow");

        let listed = registry.list_spawn_requests();
        assert_eq!(listed, vec![request]);
        // Requests are not sessions.
        assert!(registry.get_all_sessions().is_empty());
    }

    #[test]
    fn test_vanished_request_is_tolerated() {
        let (registry, _temp_dir) = registry();
        let request = registry
            .request_spawn(&PersonaType::Developer, "api", "cli", "Build the API")
            .unwrap();
        fs::remove_dir_all(&request.dir).unwrap();
        assert!(registry.list_spawn_requests().is_empty());
    }

    #[test]
    fn test_rejects_bad_suffix() {
        let (registry, _temp_dir) = registry();
        assert!(registry
            .request_spawn(&PersonaType::Developer, " ", "cli", "x")
            .is_err());
        assert!(registry
            .request_spawn(&PersonaType::Developer, "a/b", "cli", "x")
            .is_err());
    }
}
