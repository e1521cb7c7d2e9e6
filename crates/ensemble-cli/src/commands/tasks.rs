use super::Output;
use anyhow::Result;
use ensemble_core::session::TaskStatus;
use ensemble_infrastructure::SessionRegistry;
use serde_json::json;

pub fn add(
    registry: &SessionRegistry,
    out: &Output,
    session_id: &str,
    title: &str,
    description: Option<&str>,
) -> Result<()> {
    let index = registry.add_task(session_id, title, description)?;
    out.emit(&json!({ "id": session_id, "index": index }), |_| {
        println!("Added task #{}", index)
    })
}

pub fn set_status(
    registry: &SessionRegistry,
    out: &Output,
    session_id: &str,
    index: usize,
    status: TaskStatus,
) -> Result<()> {
    registry.set_task_status(session_id, index, status)?;
    out.emit(
        &json!({ "id": session_id, "index": index, "status": status.as_str() }),
        |_| println!("Task #{} -> {}", index, status),
    )
}

pub fn list(registry: &SessionRegistry, out: &Output, session_id: &str) -> Result<()> {
    let text = registry.get_task_list(session_id)?;
    let tasks: Vec<_> = registry
        .get_tasks(session_id)?
        .into_iter()
        .map(|task| {
            json!({
                "title": task.title,
                "status": task.status.map(|s| s.as_str()),
                "description": task.description,
            })
        })
        .collect();
    out.emit(&json!({ "id": session_id, "tasks": tasks }), |_| print!("{}", text))
}
