use super::Output;
use anyhow::{Result, bail};
use ensemble_core::persona::PersonaType;
use ensemble_core::session::{Session, SessionStatus, TmuxBinding};
use ensemble_infrastructure::SessionRegistry;
use serde_json::json;

fn print_row(session: &Session) {
    println!(
        "{:<32} {:<14} {:<16} {:<10} {}",
        session.id, session.persona_type, session.persona_name, session.status, session.current_work
    );
}

fn print_detail(session: &Session) {
    println!("id:           {}", session.id);
    println!("persona:      {} ({})", session.persona_name, session.persona_type);
    println!("status:       {}", session.status);
    println!("started:      {}", session.start_time.to_rfc3339());
    if let Some(workspace) = &session.workspace_id {
        println!("workspace:    {}", workspace);
    }
    if !session.current_work.is_empty() {
        println!("current work: {}", session.current_work);
    }
    if let Some(pid) = session.pid {
        println!("pid:          {}", pid);
    }
    if let Some(tmux) = &session.tmux {
        let mut target = tmux.session.clone();
        if let Some(window) = &tmux.window {
            target.push_str(&format!(":{}", window));
        }
        if let Some(pane) = &tmux.pane {
            target.push_str(&format!(".{}", pane));
        }
        println!("tmux:         {}", target);
    }
    println!(
        "tokens:       {} in / {} out ({})",
        session.input_tokens, session.output_tokens, session.model
    );
    println!("cost:         ${:.4}", session.estimated_cost_usd);
}

pub fn create(
    registry: &SessionRegistry,
    out: &Output,
    persona_type: &str,
    name: &str,
    workspace: Option<&str>,
) -> Result<()> {
    let persona_type = PersonaType::from(persona_type);
    let session = registry.create_session(&persona_type, name, workspace)?;
    out.emit(&session, |s| println!("{}", s.id))
}

pub fn list(registry: &SessionRegistry, out: &Output, all: bool) -> Result<()> {
    let sessions = if all {
        registry.get_all_sessions()
    } else {
        registry.get_active_sessions()
    };
    out.emit(&sessions, |sessions| {
        if sessions.is_empty() {
            println!("No sessions");
        }
        for session in sessions {
            print_row(session);
        }
    })
}

pub fn show(registry: &SessionRegistry, out: &Output, session_id: &str) -> Result<()> {
    let session = registry.get_session(session_id)?;
    out.emit(&session, print_detail)
}

pub fn set_status(
    registry: &SessionRegistry,
    out: &Output,
    session_id: &str,
    status: SessionStatus,
) -> Result<()> {
    registry.update_session_status(session_id, status)?;
    out.emit(&json!({ "id": session_id, "status": status }), |_| {
        println!("{} -> {}", session_id, status)
    })
}

pub fn work(
    registry: &SessionRegistry,
    out: &Output,
    session_id: &str,
    text: Option<&str>,
) -> Result<()> {
    let current_work = match text {
        Some(text) => {
            registry.update_current_work(session_id, text)?;
            registry.get_session(session_id)?.current_work
        }
        None => registry.get_current_work(session_id)?,
    };
    out.emit(
        &json!({ "id": session_id, "current_work": current_work }),
        |_| println!("{}", current_work),
    )
}

pub fn bind(
    registry: &SessionRegistry,
    out: &Output,
    session_id: &str,
    tmux_session: Option<String>,
    window: Option<String>,
    pane: Option<String>,
) -> Result<()> {
    let binding = match tmux_session {
        Some(session) => Some(TmuxBinding {
            session,
            window,
            pane,
        }),
        None if window.is_some() || pane.is_some() => {
            bail!("--window and --pane need a tmux session name")
        }
        None => None,
    };
    registry.update_tmux_binding(session_id, binding.clone())?;
    out.emit(&json!({ "id": session_id, "tmux": binding }), |_| match &binding {
        Some(b) => println!("{} bound to {}", session_id, b.session),
        None => println!("{} unbound", session_id),
    })
}

pub fn pid(registry: &SessionRegistry, out: &Output, session_id: &str, pid: Option<u32>) -> Result<()> {
    registry.update_pid(session_id, pid)?;
    out.emit(&json!({ "id": session_id, "pid": pid }), |_| match pid {
        Some(pid) => println!("{} pid {}", session_id, pid),
        None => println!("{} pid cleared", session_id),
    })
}

pub fn name(
    registry: &SessionRegistry,
    out: &Output,
    category: Option<&str>,
    persona: Option<&str>,
) -> Result<()> {
    let names = registry.name_generator();
    let name = match (category, persona) {
        (Some(category), _) => names.get_name_by_category(category),
        (None, Some(persona)) => names.get_name_for_persona(PersonaType::from(persona).as_str()),
        (None, None) => names.get_random_name(),
    };
    out.emit(&json!({ "name": name }), |_| println!("{}", name))
}
