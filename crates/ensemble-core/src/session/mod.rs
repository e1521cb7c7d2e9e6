//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: Core session record (`Session`, `SessionStatus`, `TmuxBinding`)
//! - `tracker`: Per-session read cursor (`ReadTracker`)
//! - `mailbox`: Mailbox entry format
//! - `task_list`: Task list format and the deterministic current-work summary
//! - `summarizer`: Trait for external current-work summarizers

pub mod mailbox;
mod model;
pub mod summarizer;
pub mod task_list;
mod tracker;

pub use model::{Session, SessionStatus, TmuxBinding};
pub use summarizer::WorkSummarizer;
pub use task_list::{TaskEntry, TaskStatus};
pub use tracker::{FileState, ReadTracker};
