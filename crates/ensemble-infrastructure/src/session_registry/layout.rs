//! On-disk layout of the registry root and its naming conventions.
//!
//! ```text
//! <root>/
//! ├── shared/                            # reserved, skipped by scans
//! ├── <persona>-<millis>/                # one live session
//! │   ├── session.toml
//! │   ├── tracker.toml
//! │   ├── token_usage.toml
//! │   ├── instructions.md                # mailbox, append-only
//! │   └── tasks.md
//! ├── <persona>-request-<suffix>/        # spawn request for an external spawner
//! │   └── instructions.md
//! └── <persona>-<millis>-archived/       # moved aside by an external archiver
//! ```

use ensemble_core::error::{EnsembleError, Result};
use ensemble_core::persona::PersonaType;
use std::path::{Path, PathBuf};

pub const SESSION_FILE: &str = "session.toml";
pub const TRACKER_FILE: &str = "tracker.toml";
pub const USAGE_FILE: &str = "token_usage.toml";
pub const MAILBOX_FILE: &str = "instructions.md";
pub const TASKS_FILE: &str = "tasks.md";

/// Marker separating persona type and suffix in spawn request directories.
pub const REQUEST_MARKER: &str = "-request-";

/// Directory name suffixes that take a session out of enumeration.
pub const ARCHIVE_SUFFIXES: &[&str] = &["-archived", "-completed"];

/// Name an archiver should give a finished session's directory.
pub fn archived_dir_name(session_id: &str) -> String {
    format!("{}{}", session_id, ARCHIVE_SUFFIXES[0])
}

pub fn is_archived_dir_name(name: &str) -> bool {
    ARCHIVE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

pub fn spawn_request_dir_name(persona_type: &PersonaType, suffix: &str) -> String {
    format!("{}{}{}", persona_type.as_str(), REQUEST_MARKER, suffix)
}

/// Splits a spawn request directory name into persona type and suffix.
pub fn parse_spawn_request_dir_name(name: &str) -> Option<(PersonaType, String)> {
    let (persona, suffix) = name.split_once(REQUEST_MARKER)?;
    if persona.is_empty() || suffix.is_empty() {
        return None;
    }
    Some((PersonaType::from(persona), suffix.to_string()))
}

/// Rejects ids that would escape the registry root or name a reserved entry.
pub fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id != "."
        && session_id != ".."
        && !session_id.starts_with('.')
        && !session_id.contains(['/', '\\']);
    if valid {
        Ok(())
    } else {
        Err(EnsembleError::invalid_input(format!(
            "invalid session id '{}'",
            session_id
        )))
    }
}

/// Paths of the files inside one session directory.
#[derive(Debug, Clone)]
pub struct SessionLayout {
    dir: PathBuf,
}

impl SessionLayout {
    pub fn new(root: &Path, session_id: &str) -> Self {
        Self {
            dir: root.join(session_id),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn session_file(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    pub fn tracker_file(&self) -> PathBuf {
        self.dir.join(TRACKER_FILE)
    }

    pub fn usage_file(&self) -> PathBuf {
        self.dir.join(USAGE_FILE)
    }

    pub fn mailbox_file(&self) -> PathBuf {
        self.dir.join(MAILBOX_FILE)
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.dir.join(TASKS_FILE)
    }

    /// A session exists when its metadata file does.
    pub fn exists(&self) -> bool {
        self.session_file().is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_convention() {
        assert_eq!(archived_dir_name("developer-1"), "developer-1-archived");
        assert!(is_archived_dir_name("developer-1-archived"));
        assert!(is_archived_dir_name("tester-9-completed"));
        assert!(!is_archived_dir_name("developer-1"));
    }

    #[test]
    fn test_spawn_request_names() {
        let name = spawn_request_dir_name(&PersonaType::Tester, "login-flow");
        assert_eq!(name, "tester-request-login-flow");
        assert_eq!(
            parse_spawn_request_dir_name(&name),
            Some((PersonaType::Tester, "login-flow".to_string()))
        );
        assert_eq!(parse_spawn_request_dir_name("tester-1234"), None);
        assert_eq!(parse_spawn_request_dir_name("-request-x"), None);
    }

    #[test]
    fn test_validate_session_id() {
        assert!(validate_session_id("developer-1717").is_ok());
        for bad in ["", "..", ".hidden", "a/b", "a\\b"] {
            assert!(validate_session_id(bad).is_err(), "{bad} should be rejected");
        }
    }
}
