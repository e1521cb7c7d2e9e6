//! Error types for the Ensemble registry.

use thiserror::Error;

/// A shared error type for every Ensemble crate.
///
/// Single-record operations surface these variants verbatim so callers can
/// tell a rejected creation apart from a corrupt record or a disk failure.
/// Bulk queries never return them for individual bad records.
#[derive(Error, Debug, Clone)]
pub enum EnsembleError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// An active session already exists for a singleton persona type
    #[error("Singleton violation: persona type '{persona_type}' already has active session '{existing_session_id}'")]
    SingletonViolation {
        persona_type: String,
        existing_session_id: String,
    },

    /// The session directory already exists. Retry with a fresh id.
    #[error("Session already exists: '{id}'")]
    SessionExists { id: String },

    /// A persisted record could not be parsed
    #[error("Malformed record at {path}: {message}")]
    Malformed { path: String, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied an unusable argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl EnsembleError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a SingletonViolation error
    pub fn singleton_violation(
        persona_type: impl Into<String>,
        existing_session_id: impl Into<String>,
    ) -> Self {
        Self::SingletonViolation {
            persona_type: persona_type.into(),
            existing_session_id: existing_session_id.into(),
        }
    }

    /// Creates a Malformed error
    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a SingletonViolation error
    pub fn is_singleton_violation(&self) -> bool {
        matches!(self, Self::SingletonViolation { .. })
    }

    /// Check if this is a Malformed error
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }

    /// Check if this is an IO error
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Whether the operation may succeed if simply attempted again.
    ///
    /// Only duplicate session directories qualify: the next attempt derives a
    /// new id from a later timestamp.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SessionExists { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for EnsembleError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for EnsembleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for EnsembleError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for EnsembleError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, EnsembleError>`.
pub type Result<T> = std::result::Result<T, EnsembleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_session_exists_is_retryable() {
        assert!(EnsembleError::SessionExists { id: "developer-1".into() }.is_retryable());
        assert!(!EnsembleError::singleton_violation("orchestrator", "orchestrator-1").is_retryable());
        assert!(!EnsembleError::io("disk full").is_retryable());
    }

    #[test]
    fn test_io_conversion_keeps_kind() {
        let err: EnsembleError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope").into();
        assert!(err.is_io());
        assert!(err.to_string().contains("PermissionDenied"));
    }

    #[test]
    fn test_singleton_violation_message() {
        let err = EnsembleError::singleton_violation("orchestrator", "orchestrator-42");
        assert!(err.is_singleton_violation());
        assert_eq!(
            err.to_string(),
            "Singleton violation: persona type 'orchestrator' already has active session 'orchestrator-42'"
        );
    }
}
