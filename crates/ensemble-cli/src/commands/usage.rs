use super::Output;
use anyhow::{Context, Result};
use ensemble_core::usage::TokenUsage;
use ensemble_infrastructure::SessionRegistry;
use std::io::Read;

pub enum UsageUpdate {
    None,
    Counts(u64, u64),
    FromStdin,
}

fn print_usage(usage: &TokenUsage) {
    println!(
        "{}: {} in / {} out = {} tokens, ${:.4}",
        usage.model,
        usage.input_tokens,
        usage.output_tokens,
        usage.total_tokens,
        usage.estimated_cost_usd
    );
}

pub fn usage(
    registry: &SessionRegistry,
    out: &Output,
    session_id: &str,
    update: UsageUpdate,
    model: Option<&str>,
) -> Result<()> {
    if let Some(model) = model {
        registry.set_usage_model(session_id, model)?;
    }

    match update {
        UsageUpdate::None => {}
        UsageUpdate::Counts(input, output) => {
            registry.update_token_usage(session_id, input, output)?;
        }
        UsageUpdate::FromStdin => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read agent output from stdin")?;
            if registry
                .update_token_usage_from_output(session_id, &raw)?
                .is_none()
            {
                tracing::warn!("No token report found in input");
            }
        }
    }

    let usage = registry.get_token_usage(session_id)?;
    out.emit(&usage, print_usage)
}

pub fn cost(registry: &SessionRegistry, out: &Output) -> Result<()> {
    let team = registry.get_total_team_cost();
    out.emit(&team, |team| {
        for (id, cost) in &team.per_session {
            println!("{:<32} ${:.4}", id, cost);
        }
        println!("{:<32} ${:.4}", "total", team.total_usd);
    })
}
