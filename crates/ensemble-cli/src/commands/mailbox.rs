use super::Output;
use anyhow::Result;
use ensemble_infrastructure::SessionRegistry;
use serde_json::json;

pub fn send(registry: &SessionRegistry, out: &Output, from: &str, to: &str, text: &str) -> Result<()> {
    registry.write_instructions(from, to, text)?;
    out.emit(&json!({ "from": from, "to": to, "bytes": text.len() }), |_| {
        println!("Sent to {}", to)
    })
}

pub fn inbox(registry: &SessionRegistry, out: &Output, session_id: &str) -> Result<()> {
    let text = registry.get_new_instructions(session_id)?;
    out.emit(&json!({ "id": session_id, "instructions": text }), |_| {
        print!("{}", text)
    })
}

pub fn check(registry: &SessionRegistry, out: &Output, session_id: &str) -> Result<()> {
    let check = registry.check_for_updates(session_id)?;
    out.emit(&check, |check| println!("{}", check.summary))
}
