//! Mailbox delivery and the read tracker.

use super::{SessionRegistry, system_time_to_utc};
use crate::session_registry::layout::SessionLayout;
use crate::storage::AtomicTomlFile;
use chrono::Utc;
use ensemble_core::error::{EnsembleError, Result};
use ensemble_core::session::mailbox::format_entry;
use ensemble_core::session::{FileState, ReadTracker};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Result of a non-destructive update check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateCheck {
    pub has_updates: bool,
    /// Unread bytes in the mailbox.
    pub pending_instruction_bytes: u64,
    pub tasks_changed: bool,
    pub summary: String,
}

/// Size and mtime of `path`, or `None` if it does not exist.
pub(super) fn file_state(path: &Path) -> Result<Option<FileState>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(FileState {
            modified: system_time_to_utc(meta.modified()?),
            len: meta.len(),
        })),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Appends one attributed block to the mailbox at `path`, creating it if
/// needed.
pub(super) fn append_block(path: &Path, source: &str, text: &str) -> Result<()> {
    let block = format_entry(source, text, Utc::now());
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    // One write call per block keeps concurrent appenders from interleaving
    // mid-block on local filesystems.
    file.write_all(block.as_bytes())?;
    file.flush()?;
    Ok(())
}

impl SessionRegistry {
    pub(super) fn tracker_file(layout: &SessionLayout) -> AtomicTomlFile<ReadTracker> {
        AtomicTomlFile::new(layout.tracker_file())
    }

    /// Loads the tracker, defaulting to zero offsets when absent.
    pub(super) fn load_tracker(layout: &SessionLayout) -> Result<ReadTracker> {
        Ok(Self::tracker_file(layout).load()?.unwrap_or_default())
    }

    /// Current read tracker of a session. Missing sessions and trackers read
    /// as a fresh tracker.
    pub fn get_tracker(&self, session_id: &str) -> Result<ReadTracker> {
        let layout = self.layout(session_id)?;
        Self::load_tracker(&layout)
    }

    /// Appends a timestamped block from `from_id` to `to_id`'s mailbox.
    ///
    /// # Errors
    ///
    /// `NotFound` if the target session does not exist.
    pub fn write_instructions(&self, from_id: &str, to_id: &str, text: &str) -> Result<()> {
        let layout = self.layout(to_id)?;
        if !layout.exists() {
            return Err(EnsembleError::not_found("session", to_id));
        }

        append_block(&layout.mailbox_file(), from_id, text)?;
        tracing::debug!(
            "[SessionRegistry] Delivered {} bytes from {} to {}",
            text.len(),
            from_id,
            to_id
        );
        Ok(())
    }

    /// Returns everything appended to the mailbox since the previous call
    /// and advances the tracker past it. Empty when nothing is new or the
    /// session has no mailbox.
    ///
    /// Assumes one consumer per mailbox.
    pub fn get_new_instructions(&self, session_id: &str) -> Result<String> {
        let layout = self.layout(session_id)?;
        let Some(state) = file_state(&layout.mailbox_file())? else {
            return Ok(String::new());
        };

        let mut tracker = Self::load_tracker(&layout)?;
        let Some(offset) = tracker.pending_instructions_from(state) else {
            return Ok(String::new());
        };

        let mut file = match fs::File::open(layout.mailbox_file()) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(String::new()),
            Err(e) => return Err(e.into()),
        };
        file.seek(SeekFrom::Start(offset))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        let now = Utc::now();
        tracker.advance_instructions(offset + bytes.len() as u64, now);
        tracker.last_check_time = Some(now);
        Self::tracker_file(&layout).save(&tracker)?;

        tracing::debug!(
            "[SessionRegistry] {} consumed {} mailbox bytes from offset {}",
            session_id,
            bytes.len(),
            offset
        );
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Peeks at the mailbox and task list without consuming anything.
    pub fn check_for_updates(&self, session_id: &str) -> Result<UpdateCheck> {
        let layout = self.layout(session_id)?;
        let tracker = Self::load_tracker(&layout)?;

        let pending_instruction_bytes = file_state(&layout.mailbox_file())?
            .and_then(|state| {
                tracker
                    .pending_instructions_from(state)
                    .map(|offset| state.len - offset)
            })
            .unwrap_or(0);
        let tasks_changed = file_state(&layout.tasks_file())?
            .map(|state| tracker.has_task_changes(state))
            .unwrap_or(false);

        let mut parts = Vec::new();
        if pending_instruction_bytes > 0 {
            parts.push(format!("{} bytes of new instructions", pending_instruction_bytes));
        }
        if tasks_changed {
            parts.push("task list changed".to_string());
        }
        let summary = if parts.is_empty() {
            "No updates".to_string()
        } else {
            parts.join("; ")
        };

        Ok(UpdateCheck {
            has_updates: pending_instruction_bytes > 0 || tasks_changed,
            pending_instruction_bytes,
            tasks_changed,
            summary,
        })
    }
}
