//! Per-session read cursor over the mailbox and task list files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Records how much of each session file has already been consumed.
///
/// Offsets only ever move forward. A stored offset beyond the current file
/// length means "nothing new" rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadTracker {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions_last_read_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub instructions_last_byte_offset: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_last_read_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tasks_last_byte_offset: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_time: Option<DateTime<Utc>>,
}

/// Snapshot of a file's metadata used for change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileState {
    pub modified: DateTime<Utc>,
    pub len: u64,
}

fn modified_since(file: FileState, last_read: Option<DateTime<Utc>>) -> bool {
    match last_read {
        Some(read_at) => file.modified > read_at,
        None => true,
    }
}

impl ReadTracker {
    /// Byte offset to resume reading the mailbox from, or `None` when the
    /// file holds nothing past the stored offset.
    ///
    /// The offset decides: filesystem timestamps are coarser than the clock
    /// that stamps `instructions_last_read_time`, so a write landing right
    /// after a read may carry an older mtime.
    pub fn pending_instructions_from(&self, file: FileState) -> Option<u64> {
        if file.len > self.instructions_last_byte_offset {
            Some(self.instructions_last_byte_offset)
        } else {
            None
        }
    }

    /// Whether the mailbox has content not yet consumed.
    pub fn has_new_instructions(&self, file: FileState) -> bool {
        self.pending_instructions_from(file).is_some()
    }

    /// Whether the task list changed since it was last read. The task list
    /// is rewritten in place, so a newer mtime counts as well as growth.
    pub fn has_task_changes(&self, file: FileState) -> bool {
        modified_since(file, self.tasks_last_read_time) || file.len > self.tasks_last_byte_offset
    }

    /// Records that the mailbox was consumed up to `end_offset`.
    pub fn advance_instructions(&mut self, end_offset: u64, now: DateTime<Utc>) {
        self.instructions_last_byte_offset = self.instructions_last_byte_offset.max(end_offset);
        self.instructions_last_read_time = Some(now);
    }

    /// Records that the task list was read in full at length `len`.
    pub fn mark_tasks_read(&mut self, len: u64, now: DateTime<Utc>) {
        self.tasks_last_byte_offset = self.tasks_last_byte_offset.max(len);
        self.tasks_last_read_time = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn state(len: u64, modified: DateTime<Utc>) -> FileState {
        FileState { modified, len }
    }

    #[test]
    fn test_fresh_tracker_sees_everything() {
        let tracker = ReadTracker::default();
        assert_eq!(tracker.pending_instructions_from(state(10, Utc::now())), Some(0));
        assert!(!tracker.has_new_instructions(state(0, Utc::now())));
    }

    #[test]
    fn test_offset_beyond_length_means_nothing_new() {
        let tracker = ReadTracker {
            instructions_last_byte_offset: 500,
            ..Default::default()
        };
        assert_eq!(tracker.pending_instructions_from(state(120, Utc::now())), None);
    }

    #[test]
    fn test_advance_never_moves_backwards() {
        let mut tracker = ReadTracker::default();
        let now = Utc::now();
        tracker.advance_instructions(100, now);
        tracker.advance_instructions(40, now);
        assert_eq!(tracker.instructions_last_byte_offset, 100);
        assert_eq!(tracker.instructions_last_read_time, Some(now));
    }

    #[test]
    fn test_task_changes_follow_mtime_and_length() {
        let now = Utc::now();
        let mut tracker = ReadTracker::default();
        tracker.mark_tasks_read(30, now);

        assert!(!tracker.has_task_changes(state(30, now - Duration::seconds(1))));
        assert!(tracker.has_task_changes(state(30, now + Duration::seconds(1))));
        // Grown within the same timestamp tick.
        assert!(tracker.has_task_changes(state(42, now)));

        tracker.mark_tasks_read(10, now);
        assert_eq!(tracker.tasks_last_byte_offset, 30);
    }
}
