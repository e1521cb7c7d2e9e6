//! Token usage persistence and team cost rollup.

use super::SessionRegistry;
use super::layout::SessionLayout;
use crate::storage::AtomicTomlFile;
use chrono::Utc;
use ensemble_core::error::{EnsembleError, Result};
use ensemble_core::session::Session;
use ensemble_core::usage::{TokenUsage, parse_tokens_from_raw_output};
use serde::Serialize;
use std::collections::BTreeMap;

/// Summed cost across every session with recorded usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamCost {
    pub total_usd: f64,
    pub per_session: BTreeMap<String, f64>,
}

impl SessionRegistry {
    fn usage_file(layout: &SessionLayout) -> AtomicTomlFile<TokenUsage> {
        AtomicTomlFile::new(layout.usage_file())
    }

    /// Persisted usage with derived fields recomputed, if any was recorded.
    fn load_usage(&self, layout: &SessionLayout) -> Result<Option<TokenUsage>> {
        Ok(Self::usage_file(layout).load()?.map(|mut usage| {
            usage.recompute(&self.pricing);
            usage
        }))
    }

    /// Model a fresh usage record is priced against.
    fn usage_model_for(&self, session_id: &str) -> String {
        match self.get_session(session_id) {
            Ok(session) if !session.model.is_empty() => session.model,
            _ => self.pricing.default_model().to_string(),
        }
    }

    fn mirror_into_session<F>(&self, layout: &SessionLayout, session_id: &str, f: F)
    where
        F: FnOnce(&mut Session),
    {
        if !layout.exists() {
            return;
        }
        if let Err(e) = self.modify_session(session_id, f) {
            tracing::warn!(
                "[SessionRegistry] Usage of {} saved but not mirrored into its record: {}",
                session_id,
                e
            );
        }
    }

    /// Token usage of a session, or a zeroed record when none was recorded.
    pub fn get_token_usage(&self, session_id: &str) -> Result<TokenUsage> {
        let layout = self.layout(session_id)?;
        match self.load_usage(&layout)? {
            Some(usage) => Ok(usage),
            None => Ok(TokenUsage::zeroed(self.usage_model_for(session_id))),
        }
    }

    /// Replaces the session's token counts and recomputes its cost.
    ///
    /// `token_usage.toml` is authoritative and saved first. The counts and
    /// cost are then mirrored into the session record on a best-effort
    /// basis: a missing or unreadable session record only logs a warning.
    pub fn update_token_usage(
        &self,
        session_id: &str,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Result<TokenUsage> {
        let layout = self.layout(session_id)?;
        if !layout.dir().is_dir() {
            return Err(EnsembleError::not_found("session", session_id));
        }

        let mut usage = match self.load_usage(&layout)? {
            Some(usage) => usage,
            None => TokenUsage::zeroed(self.usage_model_for(session_id)),
        };
        usage.set_counts(input_tokens, output_tokens, &self.pricing, Utc::now());
        Self::usage_file(&layout).save(&usage)?;

        self.mirror_into_session(&layout, session_id, |session| mirror_usage(session, &usage));

        tracing::debug!(
            "[SessionRegistry] {} usage: {} in / {} out, ${:.4}",
            session_id,
            usage.input_tokens,
            usage.output_tokens,
            usage.estimated_cost_usd
        );
        Ok(usage)
    }

    /// Parses agent output for a token report and records it. Returns
    /// `None` when the text holds no recognizable report.
    pub fn update_token_usage_from_output(
        &self,
        session_id: &str,
        raw_output: &str,
    ) -> Result<Option<TokenUsage>> {
        let Some(parsed) = parse_tokens_from_raw_output(raw_output) else {
            tracing::debug!("[SessionRegistry] No token report in output of {}", session_id);
            return Ok(None);
        };
        self.update_token_usage(session_id, parsed.input_tokens, parsed.output_tokens)
            .map(Some)
    }

    /// Reprices a session against `model`, keeping its counts.
    pub fn set_usage_model(&self, session_id: &str, model: &str) -> Result<TokenUsage> {
        let model = model.trim();
        if model.is_empty() {
            return Err(EnsembleError::invalid_input("model must not be empty"));
        }
        if !self.pricing.is_known(model) {
            tracing::warn!(
                "[SessionRegistry] Unknown model '{}', pricing as {}",
                model,
                self.pricing.default_model()
            );
        }

        let layout = self.layout(session_id)?;
        if !layout.dir().is_dir() {
            return Err(EnsembleError::not_found("session", session_id));
        }

        let mut usage = self
            .load_usage(&layout)?
            .unwrap_or_else(|| TokenUsage::zeroed(model));
        usage.model = model.to_string();
        usage.recompute(&self.pricing);
        usage.last_updated = Some(Utc::now());
        Self::usage_file(&layout).save(&usage)?;

        self.mirror_into_session(&layout, session_id, |session| {
            session.model = usage.model.clone();
            mirror_usage(session, &usage);
        });
        Ok(usage)
    }

    /// Sums recorded cost over every live session. Sessions without usage,
    /// or with an unreadable record, are left out.
    pub fn get_total_team_cost(&self) -> TeamCost {
        let mut team = TeamCost::default();
        for session in self.get_all_sessions() {
            let layout = SessionLayout::new(&self.root, &session.id);
            match self.load_usage(&layout) {
                Ok(Some(usage)) => {
                    team.total_usd += usage.estimated_cost_usd;
                    team.per_session.insert(session.id, usage.estimated_cost_usd);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("[SessionRegistry] Skipping usage of {}: {}", session.id, e);
                }
            }
        }
        team
    }
}

fn mirror_usage(session: &mut Session, usage: &TokenUsage) {
    session.input_tokens = usage.input_tokens;
    session.output_tokens = usage.output_tokens;
    session.total_tokens = usage.total_tokens;
    session.estimated_cost_usd = usage.estimated_cost_usd;
}

#[cfg(test)]
mod tests {
    use super::super::tests::registry;
    use super::*;
    use ensemble_core::persona::PersonaType;
    use std::fs;

    #[test]
    fn test_default_model_pricing() {
        let (registry, _temp_dir) = registry();
        let dev = registry
            .create_session(&PersonaType::Developer, "Ada", None)
            .unwrap();

        let zero = registry.get_token_usage(&dev.id).unwrap();
        assert_eq!(zero.total_tokens, 0);
        assert_eq!(zero.model, "claude-sonnet-4");

        registry
            .update_token_usage(&dev.id, 1_000_000, 1_000_000)
            .unwrap();
        let usage = registry.get_token_usage(&dev.id).unwrap();
        assert_eq!(usage.total_tokens, 2_000_000);
        assert!((usage.estimated_cost_usd - 18.0).abs() < 1e-9);

        let session = registry.get_session(&dev.id).unwrap();
        assert_eq!(session.total_tokens, 2_000_000);
        assert!((session.estimated_cost_usd - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_stored_derived_fields_are_not_trusted() {
        let (registry, _temp_dir) = registry();
        let dev = registry
            .create_session(&PersonaType::Developer, "Ada", None)
            .unwrap();
        fs::write(
            SessionLayout::new(registry.root(), &dev.id).usage_file(),
            "model = \"claude-sonnet-4\"\ninput_tokens = 1000000\noutput_tokens = 0\n\
             total_tokens = 7\nestimated_cost_usd = 999.0\n",
        )
        .unwrap();

        let usage = registry.get_token_usage(&dev.id).unwrap();
        assert_eq!(usage.total_tokens, 1_000_000);
        assert!((usage.estimated_cost_usd - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_update_from_output() {
        let (registry, _temp_dir) = registry();
        let dev = registry
            .create_session(&PersonaType::Developer, "Ada", None)
            .unwrap();

        assert!(registry
            .update_token_usage_from_output(&dev.id, "no numbers here")
            .unwrap()
            .is_none());

        let usage = registry
            .update_token_usage_from_output(&dev.id, "Token usage: 1000/200000; 199000 remaining")
            .unwrap()
            .unwrap();
        assert_eq!((usage.input_tokens, usage.output_tokens), (750, 250));
    }

    #[test]
    fn test_set_usage_model_reprices() {
        let (registry, _temp_dir) = registry();
        let dev = registry
            .create_session(&PersonaType::Developer, "Ada", None)
            .unwrap();
        registry
            .update_token_usage(&dev.id, 1_000_000, 1_000_000)
            .unwrap();

        let usage = registry.set_usage_model(&dev.id, "claude-opus-4").unwrap();
        assert!((usage.estimated_cost_usd - 90.0).abs() < 1e-9);
        let session = registry.get_session(&dev.id).unwrap();
        assert_eq!(session.model, "claude-opus-4");
        assert!((session.estimated_cost_usd - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_usage_saved_even_if_session_record_is_unreadable() {
        let (registry, _temp_dir) = registry();
        let dev = registry
            .create_session(&PersonaType::Developer, "Ada", None)
            .unwrap();
        let layout = SessionLayout::new(registry.root(), &dev.id);
        fs::write(layout.session_file(), "id = [").unwrap();

        let usage = registry.update_token_usage(&dev.id, 1_000_000, 0).unwrap();
        assert!((usage.estimated_cost_usd - 3.0).abs() < 1e-9);
        assert_eq!(registry.get_token_usage(&dev.id).unwrap().input_tokens, 1_000_000);
        assert_eq!(fs::read_to_string(layout.session_file()).unwrap(), "id = [");
    }

    #[test]
    fn test_update_missing_session_is_not_found() {
        let (registry, _temp_dir) = registry();
        assert!(registry
            .update_token_usage("developer-404", 1, 1)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_team_cost_skips_missing_and_malformed() {
        let (registry, _temp_dir) = registry();
        let a = registry
            .create_session(&PersonaType::Developer, "Ada", None)
            .unwrap();
        let b = registry
            .create_session(&PersonaType::Tester, "Holmes", None)
            .unwrap();
        let c = registry
            .create_session(&PersonaType::Writer, "Bach", None)
            .unwrap();

        registry.update_token_usage(&a.id, 1_000_000, 0).unwrap();
        registry.update_token_usage(&b.id, 0, 1_000_000).unwrap();
        fs::write(SessionLayout::new(registry.root(), &c.id).usage_file(), "model = [").unwrap();

        let team = registry.get_total_team_cost();
        assert_eq!(team.per_session.len(), 2);
        assert!((team.total_usd - 18.0).abs() < 1e-9);
        assert!((team.per_session[&a.id] - 3.0).abs() < 1e-9);
        assert!(!team.per_session.contains_key(&c.id));
    }
}
