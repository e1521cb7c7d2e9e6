//! Session domain model.
//!
//! A `Session` is the registry's record of one persona instance. It is
//! persisted as a whole record in the session directory and rewritten in
//! full on every update.

use crate::persona::PersonaType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// The worker is running
    #[default]
    Active,
    /// The worker finished its work; the directory may be archived
    Completed,
    /// The worker stopped with an error
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            "failed" => Ok(SessionStatus::Failed),
            other => Err(format!("unknown session status '{}'", other)),
        }
    }
}

/// Terminal multiplexer location a worker is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TmuxBinding {
    /// Multiplexer session name
    pub session: String,
    /// Window index or name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<String>,
    /// Pane identifier (e.g. `%3`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pane: Option<String>,
}

/// One persona instance's lifetime and state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// `<persona_type>-<unix millis>`
    pub id: String,
    pub persona_type: PersonaType,
    /// Display name, unique within the registry
    pub persona_name: String,
    /// Workspace the session works in, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    /// One-line status text, externally updated
    #[serde(default)]
    pub current_work: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub estimated_cost_usd: f64,
    #[serde(default)]
    pub model: String,
    /// Kept last so the TOML encoding emits it as a trailing table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmux: Option<TmuxBinding>,
}

impl Session {
    /// Builds the id for a session of `persona_type` created at `millis`.
    pub fn make_id(persona_type: &PersonaType, millis: i64) -> String {
        format!("{}-{}", persona_type.as_str(), millis)
    }

    /// Creates a fresh active session record.
    pub fn new(
        id: String,
        persona_type: PersonaType,
        persona_name: String,
        workspace_id: Option<String>,
        model: String,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            persona_type,
            persona_name,
            workspace_id,
            status: SessionStatus::Active,
            start_time,
            current_work: String::new(),
            pid: None,
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
            estimated_cost_usd: 0.0,
            model,
            tmux: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Session {
        Session::new(
            Session::make_id(&PersonaType::Developer, 1_700_000_000_123),
            PersonaType::Developer,
            "Curie".to_string(),
            Some("ws-1".to_string()),
            "claude-sonnet-4".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_make_id() {
        assert_eq!(
            Session::make_id(&PersonaType::Custom("qa-lead".into()), 42),
            "qa-lead-42"
        );
    }

    #[test]
    fn test_toml_roundtrip_with_tmux_binding() {
        let mut session = sample();
        session.pid = Some(4242);
        session.tmux = Some(TmuxBinding {
            session: "team".to_string(),
            window: Some("2".to_string()),
            pane: None,
        });

        let encoded = toml::to_string_pretty(&session).unwrap();
        let decoded: Session = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded, session);
        assert!(encoded.contains("status = \"active\""));
        assert!(encoded.contains("persona_type = \"developer\""));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Completed".parse::<SessionStatus>(), Ok(SessionStatus::Completed));
        assert!("paused".parse::<SessionStatus>().is_err());
    }
}
