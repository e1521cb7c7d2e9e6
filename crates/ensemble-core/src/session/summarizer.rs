//! Pluggable current-work summarization.

use super::model::Session;
use crate::error::Result;

/// External collaborator that condenses a session's task list into one line.
///
/// Implementations typically call out to a model or another process and may
/// be slow or fail; the registry falls back to
/// [`summarize_current_work`](super::task_list::summarize_current_work)
/// whenever this returns an error or `None`.
pub trait WorkSummarizer: Send + Sync {
    fn summarize(&self, session: &Session, task_list: &str) -> Result<Option<String>>;
}
