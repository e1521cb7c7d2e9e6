use super::Output;
use anyhow::Result;
use ensemble_core::persona::PersonaType;
use ensemble_infrastructure::SessionRegistry;

pub fn request(
    registry: &SessionRegistry,
    out: &Output,
    persona_type: &str,
    suffix: &str,
    from: &str,
    text: &str,
) -> Result<()> {
    let request = registry.request_spawn(&PersonaType::from(persona_type), suffix, from, text)?;
    out.emit(&request, |r| println!("{}", r.dir.display()))
}

pub fn list(registry: &SessionRegistry, out: &Output) -> Result<()> {
    let requests = registry.list_spawn_requests();
    out.emit(&requests, |requests| {
        if requests.is_empty() {
            println!("No pending requests");
        }
        for request in requests {
            println!("{:<14} {}", request.persona_type, request.suffix);
        }
    })
}
