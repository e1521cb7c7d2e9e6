//! Per-model token pricing.
//!
//! Lookup order:
//! 1. Exact model id (case-insensitive)
//! 2. Longest known id that prefixes the model (dated releases such as
//!    `claude-sonnet-4-20250514` resolve to `claude-sonnet-4`)
//! 3. The default model's pricing

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Model every session is priced against unless told otherwise.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4";

/// USD per 1M tokens for a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    pub const fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }

    /// `(input / 1e6) * input_rate + (output / 1e6) * output_rate`
    pub fn compute_cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        let input_cost = (input_tokens as f64 / 1_000_000.0) * self.input_per_million;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * self.output_per_million;
        input_cost + output_cost
    }
}

const BUILTIN_PRICING: &[(&str, ModelPricing)] = &[
    ("claude-opus-4", ModelPricing::new(15.0, 75.0)),
    ("claude-sonnet-4", ModelPricing::new(3.0, 15.0)),
    ("claude-haiku-4-5", ModelPricing::new(1.0, 5.0)),
    ("claude-3-7-sonnet", ModelPricing::new(3.0, 15.0)),
    ("claude-3-5-sonnet", ModelPricing::new(3.0, 15.0)),
    ("claude-3-5-haiku", ModelPricing::new(0.8, 4.0)),
];

/// Pricing registry with fallbacks.
#[derive(Debug, Clone)]
pub struct PricingTable {
    default_model: String,
    pricing: HashMap<String, ModelPricing>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl PricingTable {
    /// Built-in pricing with `default_model` as the fallback.
    ///
    /// An unknown `default_model` falls back to [`DEFAULT_MODEL`]'s rates.
    pub fn new(default_model: &str) -> Self {
        let pricing = BUILTIN_PRICING
            .iter()
            .map(|(model, price)| (model.to_string(), *price))
            .collect();
        Self {
            default_model: default_model.to_lowercase(),
            pricing,
        }
    }

    /// Adds or replaces pricing entries.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, ModelPricing>) -> Self {
        for (model, price) in overrides {
            self.add(model, *price);
        }
        self
    }

    pub fn add(&mut self, model: &str, pricing: ModelPricing) {
        self.pricing.insert(model.to_lowercase(), pricing);
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Whether `model` resolves without falling back to the default.
    pub fn is_known(&self, model: &str) -> bool {
        self.resolve(&model.to_lowercase()).is_some()
    }

    fn resolve(&self, model: &str) -> Option<ModelPricing> {
        if let Some(price) = self.pricing.get(model) {
            return Some(*price);
        }
        self.pricing
            .iter()
            .filter(|(known, _)| model.starts_with(known.as_str()))
            .max_by_key(|(known, _)| known.len())
            .map(|(_, price)| *price)
    }

    /// Pricing for `model`, falling back to the default model.
    pub fn lookup(&self, model: &str) -> ModelPricing {
        let model = model.to_lowercase();
        if let Some(price) = self.resolve(&model) {
            return price;
        }
        tracing::debug!("[PricingTable] Unknown model '{}', using default pricing", model);
        self.resolve(&self.default_model)
            .unwrap_or(ModelPricing::new(3.0, 15.0))
    }

    pub fn compute_cost(&self, model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
        self.lookup(model).compute_cost(input_tokens, output_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_million_each() {
        let table = PricingTable::default();
        assert_eq!(table.compute_cost(DEFAULT_MODEL, 1_000_000, 1_000_000), 18.0);
    }

    #[test]
    fn test_dated_release_resolves_by_prefix() {
        let table = PricingTable::default();
        assert_eq!(
            table.lookup("claude-opus-4-20250514"),
            ModelPricing::new(15.0, 75.0)
        );
        assert!(table.is_known("Claude-3-5-Haiku-20241022"));
    }

    #[test]
    fn test_unknown_model_uses_default() {
        let table = PricingTable::default();
        assert!(!table.is_known("gpt-5"));
        assert_eq!(table.lookup("gpt-5"), ModelPricing::new(3.0, 15.0));
    }

    #[test]
    fn test_overrides_replace_builtin() {
        let mut overrides = BTreeMap::new();
        overrides.insert("gpt-5".to_string(), ModelPricing::new(1.25, 10.0));
        overrides.insert("claude-sonnet-4".to_string(), ModelPricing::new(2.0, 10.0));
        let table = PricingTable::default().with_overrides(&overrides);

        assert_eq!(table.compute_cost("gpt-5", 2_000_000, 0), 2.5);
        assert_eq!(table.compute_cost("mystery", 1_000_000, 1_000_000), 12.0);
    }
}
