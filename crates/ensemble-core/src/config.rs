//! Registry configuration model.

use crate::persona::PersonaType;
use crate::session::task_list::DEFAULT_SUMMARY_MAX_LEN;
use crate::usage::{DEFAULT_MODEL, ModelPricing, PricingTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration, read from `config.toml`.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Directory holding one subdirectory per session. `None` uses the
    /// platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_root: Option<PathBuf>,
    /// Reserved subdirectory of the registry root for shared files; never
    /// treated as a session.
    pub shared_dir_name: String,
    /// Persona types limited to one active session at a time.
    pub singleton_personas: Vec<String>,
    /// Model new sessions are priced against.
    pub default_model: String,
    /// Maximum length of the fallback current-work summary.
    pub current_work_max_len: usize,
    /// Additional or replacement pricing, keyed by model id.
    pub pricing: BTreeMap<String, ModelPricing>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            registry_root: None,
            shared_dir_name: "shared".to_string(),
            singleton_personas: vec!["orchestrator".to_string(), "architect".to_string()],
            default_model: DEFAULT_MODEL.to_string(),
            current_work_max_len: DEFAULT_SUMMARY_MAX_LEN,
            pricing: BTreeMap::new(),
        }
    }
}

impl EnsembleConfig {
    /// Whether `persona_type` may only have one active session.
    pub fn is_singleton(&self, persona_type: &PersonaType) -> bool {
        self.singleton_personas
            .iter()
            .any(|name| PersonaType::from(name.as_str()) == *persona_type)
    }

    /// Pricing table with the configured overrides applied.
    pub fn pricing_table(&self) -> PricingTable {
        PricingTable::new(&self.default_model).with_overrides(&self.pricing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config: EnsembleConfig = toml::from_str("").unwrap();
        assert_eq!(config, EnsembleConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config: EnsembleConfig = toml::from_str(
            r#"
singleton_personas = ["Orchestrator", "qa lead"]
default_model = "claude-opus-4"

[pricing.gpt-5]
input_per_million = 1.25
output_per_million = 10.0
"#,
        )
        .unwrap();

        assert_eq!(config.shared_dir_name, "shared");
        assert!(config.is_singleton(&PersonaType::Orchestrator));
        assert!(config.is_singleton(&PersonaType::from("qa-lead")));
        assert!(!config.is_singleton(&PersonaType::Architect));
        assert_eq!(config.pricing_table().compute_cost("gpt-5", 1_000_000, 0), 1.25);
        assert_eq!(
            config.pricing_table().compute_cost("unknown", 1_000_000, 0),
            15.0
        );
    }
}
