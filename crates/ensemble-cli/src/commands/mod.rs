pub mod mailbox;
pub mod session;
pub mod spawn;
pub mod tasks;
pub mod usage;

use anyhow::Result;
use serde::Serialize;

/// Chooses between human-readable and JSON output.
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Prints `value` as JSON in `--json` mode, else runs `human`.
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human(value);
        }
        Ok(())
    }
}
