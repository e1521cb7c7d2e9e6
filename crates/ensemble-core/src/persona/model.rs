//! Persona type model.
//!
//! A persona type classifies the role a worker plays. The well-known roles
//! have dedicated variants; anything else is carried verbatim as `Custom` so
//! externally spawned roles (e.g. `backend-developer`) round-trip unchanged.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Role classification for a worker process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PersonaType {
    /// Coordinates the other personas and owns the overall plan
    Orchestrator,
    /// Designs structure and interfaces before implementation starts
    Architect,
    /// Implements tasks
    Developer,
    /// Writes and runs verification
    Tester,
    /// Reviews changes produced by others
    Reviewer,
    /// UI and UX work
    Designer,
    /// Build, deployment and infrastructure
    DevOps,
    /// Writes documentation
    Writer,
    /// Any other role, kept as its normalized identifier
    Custom(String),
}

impl PersonaType {
    /// Canonical identifier used in session ids and directory names.
    pub fn as_str(&self) -> &str {
        match self {
            PersonaType::Orchestrator => "orchestrator",
            PersonaType::Architect => "architect",
            PersonaType::Developer => "developer",
            PersonaType::Tester => "tester",
            PersonaType::Reviewer => "reviewer",
            PersonaType::Designer => "designer",
            PersonaType::DevOps => "devops",
            PersonaType::Writer => "writer",
            PersonaType::Custom(name) => name,
        }
    }

    /// Normalizes free text into an identifier safe for directory names:
    /// lowercase, with every run of non-alphanumeric characters collapsed
    /// into a single `-`.
    fn normalize(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        for c in raw.trim().chars() {
            if c.is_ascii_alphanumeric() {
                out.push(c.to_ascii_lowercase());
            } else if !out.ends_with('-') && !out.is_empty() {
                out.push('-');
            }
        }
        while out.ends_with('-') {
            out.pop();
        }
        out
    }
}

impl FromStr for PersonaType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = Self::normalize(s);
        Ok(match normalized.as_str() {
            "orchestrator" => PersonaType::Orchestrator,
            "architect" => PersonaType::Architect,
            "developer" => PersonaType::Developer,
            "tester" => PersonaType::Tester,
            "reviewer" => PersonaType::Reviewer,
            "designer" => PersonaType::Designer,
            "devops" => PersonaType::DevOps,
            "writer" => PersonaType::Writer,
            _ => PersonaType::Custom(normalized),
        })
    }
}

impl From<String> for PersonaType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(persona_type) => persona_type,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for PersonaType {
    fn from(value: &str) -> Self {
        PersonaType::from(value.to_string())
    }
}

impl From<PersonaType> for String {
    fn from(value: PersonaType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PersonaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(PersonaType::from("Orchestrator"), PersonaType::Orchestrator);
        assert_eq!(PersonaType::from("DEVOPS"), PersonaType::DevOps);
    }

    #[test]
    fn test_custom_types_are_normalized() {
        let persona = PersonaType::from("Backend Developer!");
        assert_eq!(persona, PersonaType::Custom("backend-developer".to_string()));
        assert_eq!(persona.as_str(), "backend-developer");
    }

    #[test]
    fn test_serde_uses_plain_string() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            persona_type: PersonaType,
        }

        let json = serde_json::to_string(&Wrapper {
            persona_type: PersonaType::Tester,
        })
        .unwrap();
        assert_eq!(json, r#"{"persona_type":"tester"}"#);

        let back: Wrapper = serde_json::from_str(r#"{"persona_type":"qa-lead"}"#).unwrap();
        assert_eq!(back.persona_type.as_str(), "qa-lead");
    }
}
