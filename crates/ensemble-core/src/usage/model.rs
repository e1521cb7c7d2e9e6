//! Token usage record.

use super::pricing::PricingTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token counts and cost for one session, keyed by the session id.
///
/// `total_tokens` and `estimated_cost_usd` are derived values. They are
/// written out for readability but always recomputed after loading via
/// [`TokenUsage::recompute`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub model: String,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub estimated_cost_usd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl TokenUsage {
    /// A zeroed record priced against `model`.
    pub fn zeroed(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
            estimated_cost_usd: 0.0,
            last_updated: None,
        }
    }

    /// Re-derives the total and the cost from the raw counts.
    pub fn recompute(&mut self, pricing: &PricingTable) {
        self.total_tokens = self.input_tokens.saturating_add(self.output_tokens);
        self.estimated_cost_usd =
            pricing.compute_cost(&self.model, self.input_tokens, self.output_tokens);
    }

    /// Replaces the counts and recomputes derived values.
    pub fn set_counts(
        &mut self,
        input_tokens: u64,
        output_tokens: u64,
        pricing: &PricingTable,
        now: DateTime<Utc>,
    ) {
        self.input_tokens = input_tokens;
        self.output_tokens = output_tokens;
        self.last_updated = Some(now);
        self.recompute(pricing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::pricing::DEFAULT_MODEL;

    #[test]
    fn test_recompute_ignores_stored_derived_values() {
        let mut usage: TokenUsage = toml::from_str(
            r#"
model = "claude-sonnet-4"
input_tokens = 1000000
output_tokens = 1000000
total_tokens = 5
estimated_cost_usd = 999.0
"#,
        )
        .unwrap();

        usage.recompute(&PricingTable::default());
        assert_eq!(usage.total_tokens, 2_000_000);
        assert_eq!(usage.estimated_cost_usd, 18.0);
    }

    #[test]
    fn test_set_counts() {
        let mut usage = TokenUsage::zeroed(DEFAULT_MODEL);
        let now = Utc::now();
        usage.set_counts(500_000, 100_000, &PricingTable::default(), now);
        assert_eq!(usage.total_tokens, 600_000);
        assert!((usage.estimated_cost_usd - 3.0).abs() < 1e-9);
        assert_eq!(usage.last_updated, Some(now));
    }
}
