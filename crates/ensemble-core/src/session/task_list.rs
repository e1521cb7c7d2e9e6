//! Task list document format and its deterministic summary.
//!
//! A task list is a Markdown document of sections. Each section starts with a
//! `## ` header line and carries a `Status:` line whose value is one of
//! `not started`, `in progress` or `completed`, plus an optional
//! `Description:` line:
//!
//! ```text
//! # Tasks
//!
//! ## Task 1: Build login endpoint
//! Status: in progress
//! Description: POST /login returning a session token
//! ```
//!
//! Everything is matched by line prefix so hand-edited files stay parseable.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Text written to a freshly provisioned session.
pub const EMPTY_TASK_LIST: &str = "# Tasks\n\n";

/// Default maximum length of a current-work summary, in characters.
pub const DEFAULT_SUMMARY_MAX_LEN: usize = 100;

const HEADER_PREFIX: &str = "## ";
const STATUS_PREFIX: &str = "status:";
const DESCRIPTION_PREFIX: &str = "description:";

static COMPLETED_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcompleted\b").expect("completed pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not started",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "not started" => Ok(TaskStatus::NotStarted),
            "in progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!("unknown task status '{}'", other)),
        }
    }
}

/// One parsed task section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    /// Header text without the `## ` marker or a `Task N:` prefix
    pub title: String,
    pub status: Option<TaskStatus>,
    pub description: Option<String>,
}

impl TaskEntry {
    /// The description when present, otherwise the title.
    pub fn summary_text(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.title)
    }
}

/// Strips list markers and emphasis so `- **Status**: done` matches too.
fn clean_line(line: &str) -> String {
    line.trim()
        .trim_start_matches(['-', '*', ' '])
        .replace("**", "")
        .trim()
        .to_string()
}

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    if line.len() >= prefix.len()
        && line.is_char_boundary(prefix.len())
        && line[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(line[prefix.len()..].trim())
    } else {
        None
    }
}

fn strip_task_number(header: &str) -> &str {
    let Some(rest) = strip_prefix_ci(header, "task") else {
        return header;
    };
    match rest.split_once(':') {
        Some((number, title)) if number.trim().chars().all(|c| c.is_ascii_digit()) => title.trim(),
        _ => header,
    }
}

/// Parses every task section in document order.
pub fn parse_tasks(text: &str) -> Vec<TaskEntry> {
    let mut tasks: Vec<TaskEntry> = Vec::new();

    for raw in text.lines() {
        if let Some(header) = raw.trim_start().strip_prefix(HEADER_PREFIX) {
            tasks.push(TaskEntry {
                title: strip_task_number(header.trim()).to_string(),
                status: None,
                description: None,
            });
            continue;
        }

        let Some(current) = tasks.last_mut() else {
            continue;
        };
        let line = clean_line(raw);
        if current.status.is_none()
            && let Some(value) = strip_prefix_ci(&line, STATUS_PREFIX)
        {
            current.status = value.parse().ok();
            continue;
        }
        if current.description.is_none()
            && let Some(value) = strip_prefix_ci(&line, DESCRIPTION_PREFIX)
            && !value.is_empty()
        {
            current.description = Some(value.to_string());
        }
    }

    tasks
}

/// Truncates to `max_len` characters, marking the cut with `...`.
pub fn truncate_with_ellipsis(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_len).collect();
    format!("{}...", kept.trim_end())
}

/// Deterministic one-line summary of what a session is doing.
///
/// Order: the first in-progress task, then the first not-started task
/// (prefixed `Awaiting:`), then "All tasks completed" if the document
/// mentions completion anywhere, else "No active tasks".
pub fn summarize_current_work(text: &str, max_len: usize) -> String {
    let tasks = parse_tasks(text);

    if let Some(task) = tasks
        .iter()
        .find(|t| t.status == Some(TaskStatus::InProgress))
    {
        return truncate_with_ellipsis(task.summary_text(), max_len);
    }

    if let Some(task) = tasks
        .iter()
        .find(|t| t.status == Some(TaskStatus::NotStarted))
    {
        return format!("Awaiting: {}", truncate_with_ellipsis(task.summary_text(), max_len));
    }

    if COMPLETED_WORD_RE.is_match(text) {
        "All tasks completed".to_string()
    } else {
        "No active tasks".to_string()
    }
}

/// Returns `text` with a new not-started task section appended.
pub fn append_task(text: &str, title: &str, description: Option<&str>) -> String {
    let number = parse_tasks(text).len() + 1;
    let mut out = text.to_string();
    if !out.is_empty() && !out.ends_with("\n\n") {
        out.push_str(if out.ends_with('\n') { "\n" } else { "\n\n" });
    }
    out.push_str(&format!("{}Task {}: {}\n", HEADER_PREFIX, number, title.trim()));
    out.push_str(&format!("Status: {}\n", TaskStatus::NotStarted));
    if let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) {
        out.push_str(&format!("Description: {}\n", description));
    }
    out
}

/// Rewrites the status of the `index`-th task (zero based).
///
/// Returns `None` if there is no such task. A task without a status line
/// gets one inserted right below its header.
pub fn set_task_status(text: &str, index: usize, status: TaskStatus) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let headers: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.trim_start().starts_with(HEADER_PREFIX))
        .map(|(i, _)| i)
        .collect();

    let start = *headers.get(index)?;
    let end = headers.get(index + 1).copied().unwrap_or(lines.len());
    let status_line = format!("Status: {}", status);

    let mut out: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    match (start + 1..end).find(|&i| strip_prefix_ci(&clean_line(lines[i]), STATUS_PREFIX).is_some()) {
        Some(i) => out[i] = status_line,
        None => out.insert(start + 1, status_line),
    }

    let mut joined = out.join("\n");
    if text.ends_with('\n') {
        joined.push('\n');
    }
    Some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# Tasks\n\n\
## Task 1: Scaffold project\n\
Status: completed\n\n\
## Task 2: Build login endpoint\n\
Status: in progress\n\
Description: POST /login returning a session token\n\n\
## Task 3: Write docs\n\
Status: not started\n";

    #[test]
    fn test_parse_sections() {
        let tasks = parse_tasks(SAMPLE);
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].title, "Scaffold project");
        assert_eq!(tasks[0].status, Some(TaskStatus::Completed));
        assert_eq!(
            tasks[1].description.as_deref(),
            Some("POST /login returning a session token")
        );
        assert_eq!(tasks[2].status, Some(TaskStatus::NotStarted));
    }

    #[test]
    fn test_in_progress_wins() {
        assert_eq!(
            summarize_current_work(SAMPLE, DEFAULT_SUMMARY_MAX_LEN),
            "POST /login returning a session token"
        );
    }

    #[test]
    fn test_awaiting_when_nothing_in_progress() {
        let text = "## Task 1: Draft schema\nStatus: completed\n\n## Task 2: Seed data\nStatus: not started\n";
        assert_eq!(summarize_current_work(text, 100), "Awaiting: Seed data");
    }

    #[test]
    fn test_all_completed_and_no_tasks() {
        let done = "## Task 1: Draft schema\n- **Status**: Completed\n";
        assert_eq!(summarize_current_work(done, 100), "All tasks completed");
        assert_eq!(summarize_current_work(EMPTY_TASK_LIST, 100), "No active tasks");
        assert_eq!(summarize_current_work("", 100), "No active tasks");
    }

    #[test]
    fn test_completed_must_be_a_whole_word() {
        assert_eq!(
            summarize_current_work("# Tasks\n\nTwo items uncompleted from last sprint\n", 100),
            "No active tasks"
        );
        assert_eq!(
            summarize_current_work("# Tasks\n\nEverything COMPLETED.\n", 100),
            "All tasks completed"
        );
    }

    #[test]
    fn test_truncation_adds_ellipsis() {
        let text = format!("## {}\nStatus: in progress\n", "x".repeat(150));
        let summary = summarize_current_work(&text, 100);
        assert_eq!(summary.chars().count(), 103);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_append_and_set_status() {
        let text = append_task(EMPTY_TASK_LIST, "Build API", Some("REST endpoints"));
        let text = append_task(&text, "Test API", None);
        assert_eq!(
            text,
            "# Tasks\n\n## Task 1: Build API\nStatus: not started\nDescription: REST endpoints\n\n## Task 2: Test API\nStatus: not started\n"
        );

        let text = set_task_status(&text, 1, TaskStatus::InProgress).unwrap();
        assert_eq!(summarize_current_work(&text, 100), "Test API");
        assert!(set_task_status(&text, 5, TaskStatus::Completed).is_none());
    }

    #[test]
    fn test_set_status_inserts_missing_line() {
        let text = "## Loose task\nsome notes\n";
        let updated = set_task_status(text, 0, TaskStatus::Completed).unwrap();
        assert_eq!(updated, "## Loose task\nStatus: completed\nsome notes\n");
    }
}
