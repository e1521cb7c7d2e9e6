//! Task list access and current-work summaries.

use super::SessionRegistry;
use super::layout::SessionLayout;
use crate::storage::write_atomic;
use chrono::Utc;
use ensemble_core::error::{EnsembleError, Result};
use ensemble_core::session::task_list::{self, EMPTY_TASK_LIST};
use ensemble_core::session::{TaskEntry, TaskStatus};
use std::fs;

fn read_task_list(layout: &SessionLayout) -> Result<Option<String>> {
    match fs::read_to_string(layout.tasks_file()) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl SessionRegistry {
    fn existing_layout(&self, session_id: &str) -> Result<SessionLayout> {
        let layout = self.layout(session_id)?;
        if layout.exists() {
            Ok(layout)
        } else {
            Err(EnsembleError::not_found("session", session_id))
        }
    }

    /// Full task list text, recording the read in the tracker. A missing
    /// task list reads as empty.
    pub fn get_task_list(&self, session_id: &str) -> Result<String> {
        let layout = self.layout(session_id)?;
        let Some(text) = read_task_list(&layout)? else {
            return Ok(String::new());
        };

        let mut tracker = Self::load_tracker(&layout)?;
        let now = Utc::now();
        tracker.mark_tasks_read(text.len() as u64, now);
        tracker.last_check_time = Some(now);
        Self::tracker_file(&layout).save(&tracker)?;

        Ok(text)
    }

    /// Parsed task sections in document order.
    pub fn get_tasks(&self, session_id: &str) -> Result<Vec<TaskEntry>> {
        let layout = self.layout(session_id)?;
        Ok(read_task_list(&layout)?
            .map(|text| task_list::parse_tasks(&text))
            .unwrap_or_default())
    }

    /// Appends a not-started task and returns its zero-based index.
    pub fn add_task(
        &self,
        session_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<usize> {
        if title.trim().is_empty() {
            return Err(EnsembleError::invalid_input("task title must not be empty"));
        }
        let layout = self.existing_layout(session_id)?;
        let current = read_task_list(&layout)?.unwrap_or_else(|| EMPTY_TASK_LIST.to_string());
        let updated = task_list::append_task(&current, title, description);
        write_atomic(&layout.tasks_file(), updated.as_bytes())?;

        let index = task_list::parse_tasks(&updated).len().saturating_sub(1);
        tracing::debug!("[SessionRegistry] {} added task #{}: {}", session_id, index, title.trim());
        Ok(index)
    }

    /// Rewrites the status of the `index`-th task (zero based).
    pub fn set_task_status(&self, session_id: &str, index: usize, status: TaskStatus) -> Result<()> {
        let layout = self.existing_layout(session_id)?;
        let current = read_task_list(&layout)?.unwrap_or_default();
        let updated = task_list::set_task_status(&current, index, status)
            .ok_or_else(|| EnsembleError::not_found("task", format!("{}#{}", session_id, index)))?;
        write_atomic(&layout.tasks_file(), updated.as_bytes())?;
        Ok(())
    }

    /// One-line summary of what the session is working on.
    ///
    /// Asks the installed summarizer first; any error or empty answer falls
    /// back to parsing the task list. Does not touch the tracker.
    pub fn get_current_work(&self, session_id: &str) -> Result<String> {
        let layout = self.layout(session_id)?;
        let text = read_task_list(&layout)?.unwrap_or_default();

        if let Some(summarizer) = &self.summarizer {
            let session = self.get_session(session_id)?;
            match summarizer.summarize(&session, &text) {
                Ok(Some(summary)) if !summary.trim().is_empty() => {
                    return Ok(task_list::truncate_with_ellipsis(
                        summary.lines().next().unwrap_or("").trim(),
                        self.config.current_work_max_len,
                    ));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        "[SessionRegistry] Summarizer failed for {}, using task list: {}",
                        session_id,
                        e
                    );
                }
            }
        }

        Ok(task_list::summarize_current_work(&text, self.config.current_work_max_len))
    }
}
