//! File-backed session registry.
//!
//! The registry holds no authoritative in-memory state: every query scans
//! the registry root, and a session exists exactly when its `session.toml`
//! does. Records are rewritten whole on each update with no cross-process
//! locking, so concurrent updates to one session are last-writer-wins.
//!
//! Bulk queries (`get_all_sessions`, `get_active_sessions`,
//! `get_total_team_cost`) skip unreadable or malformed records so one
//! corrupt session never hides the rest. Single-record operations surface
//! every error.

pub mod layout;
mod mailbox;
mod spawn;
mod tasks;
mod usage;

pub use mailbox::UpdateCheck;
pub use spawn::SpawnRequest;
pub use usage::TeamCost;

use crate::storage::{AtomicTomlFile, write_atomic};
use chrono::{DateTime, TimeZone, Utc};
use ensemble_core::config::EnsembleConfig;
use ensemble_core::error::{EnsembleError, Result};
use ensemble_core::persona::{NameGenerator, PersonaType};
use ensemble_core::session::task_list::EMPTY_TASK_LIST;
use ensemble_core::session::{
    ReadTracker, Session, SessionStatus, TmuxBinding, WorkSummarizer,
};
use ensemble_core::usage::PricingTable;
use layout::{
    SessionLayout, is_archived_dir_name, parse_spawn_request_dir_name, validate_session_id,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Requested names treated as "pick one for me".
const PLACEHOLDER_NAMES: &[&str] = &[
    "agent", "assistant", "bot", "default", "new", "none", "persona", "tbd", "unnamed", "worker",
];

/// Whether `name` is empty or a generic placeholder such as `worker`,
/// `agent-2` or the persona type itself.
pub fn is_placeholder_name(name: &str, persona_type: &PersonaType) -> bool {
    let lowered = name.trim().to_lowercase();
    if lowered.is_empty() || lowered == persona_type.as_str() {
        return true;
    }
    let stem = lowered.trim_end_matches(|c: char| c.is_ascii_digit() || c == '-' || c == '_' || c == ' ');
    PLACEHOLDER_NAMES.contains(&stem) || stem == persona_type.as_str()
}

/// Session registry rooted at one directory.
pub struct SessionRegistry {
    root: PathBuf,
    config: EnsembleConfig,
    pricing: PricingTable,
    names: Arc<NameGenerator>,
    summarizer: Option<Arc<dyn WorkSummarizer>>,
    /// Last id timestamp issued by this process; also serializes creation.
    last_id_millis: Mutex<i64>,
}

impl SessionRegistry {
    /// Opens (creating if needed) the registry at `root` with a fresh name
    /// generator.
    pub fn open(root: impl Into<PathBuf>, config: EnsembleConfig) -> Result<Self> {
        Self::open_with_names(root, config, Arc::new(NameGenerator::new()))
    }

    /// Opens the registry, reserving every persona name already in use so
    /// `names` never reissues one.
    pub fn open_with_names(
        root: impl Into<PathBuf>,
        config: EnsembleConfig,
        names: Arc<NameGenerator>,
    ) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(&config.shared_dir_name))?;

        let registry = Self {
            pricing: config.pricing_table(),
            root,
            config,
            names,
            summarizer: None,
            last_id_millis: Mutex::new(0),
        };

        let existing = registry.get_all_sessions();
        for session in &existing {
            registry.names.mark_used(&session.persona_name);
        }
        tracing::info!(
            "[SessionRegistry] Opened {:?} ({} existing sessions)",
            registry.root,
            existing.len()
        );
        Ok(registry)
    }

    /// Installs the external current-work summarizer.
    pub fn with_summarizer(mut self, summarizer: Arc<dyn WorkSummarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    pub fn name_generator(&self) -> &NameGenerator {
        &self.names
    }

    fn layout(&self, session_id: &str) -> Result<SessionLayout> {
        validate_session_id(session_id)?;
        Ok(SessionLayout::new(&self.root, session_id))
    }

    fn session_file(layout: &SessionLayout) -> AtomicTomlFile<Session> {
        AtomicTomlFile::new(layout.session_file())
    }

    // ============================================================================
    // Creation
    // ============================================================================

    /// Creates and provisions a new session.
    ///
    /// # Errors
    ///
    /// - `SingletonViolation` if `persona_type` is a singleton type with an
    ///   active session
    /// - `InvalidInput` if the requested name belongs to another live session
    /// - `SessionExists` if the directory already exists (retryable)
    /// - `Io` on any filesystem failure
    pub fn create_session(
        &self,
        persona_type: &PersonaType,
        requested_name: &str,
        workspace_id: Option<&str>,
    ) -> Result<Session> {
        if persona_type.as_str().is_empty() {
            return Err(EnsembleError::invalid_input("persona type must not be empty"));
        }
        // Ids of such types would be skipped by every scan.
        let sample_id = Session::make_id(persona_type, 0);
        if parse_spawn_request_dir_name(&sample_id).is_some() || is_archived_dir_name(&sample_id) {
            return Err(EnsembleError::invalid_input(format!(
                "persona type '{}' clashes with the spawn request or archive naming",
                persona_type
            )));
        }

        // Held for the whole creation so in-process callers cannot race the
        // singleton check.
        let mut last_millis = self.last_id_millis.lock().unwrap_or_else(PoisonError::into_inner);

        let live = self.get_all_sessions();
        if self.config.is_singleton(persona_type)
            && let Some(existing) = live
                .iter()
                .find(|s| s.is_active() && s.persona_type == *persona_type)
        {
            tracing::warn!(
                "[SessionRegistry] Rejected second active '{}' session (existing: {})",
                persona_type,
                existing.id
            );
            return Err(EnsembleError::singleton_violation(
                persona_type.as_str(),
                existing.id.clone(),
            ));
        }

        // Other handles on this root may have issued names since `open`.
        for session in &live {
            self.names.mark_used(&session.persona_name);
        }

        let persona_name = if is_placeholder_name(requested_name, persona_type) {
            self.names.get_name_for_persona(persona_type.as_str())
        } else {
            let name = requested_name.trim().to_string();
            if let Some(owner) = live
                .iter()
                .find(|s| s.persona_name.eq_ignore_ascii_case(&name))
            {
                return Err(EnsembleError::invalid_input(format!(
                    "persona name '{}' is already used by session '{}'",
                    name, owner.id
                )));
            }
            self.names.mark_used(&name);
            name
        };

        let now = Utc::now();
        let millis = now.timestamp_millis().max(*last_millis + 1);
        *last_millis = millis;
        let start_time = Utc.timestamp_millis_opt(millis).single().unwrap_or(now);
        let id = Session::make_id(persona_type, millis);

        let layout = self.layout(&id)?;
        match fs::create_dir(layout.dir()) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(EnsembleError::SessionExists { id });
            }
            Err(e) => return Err(e.into()),
        }

        write_atomic(&layout.tasks_file(), EMPTY_TASK_LIST.as_bytes())?;
        AtomicTomlFile::<ReadTracker>::new(layout.tracker_file()).save(&ReadTracker::default())?;

        let session = Session::new(
            id,
            persona_type.clone(),
            persona_name,
            workspace_id.map(str::to_string),
            self.pricing.default_model().to_string(),
            start_time,
        );
        // Written last: the session becomes visible only once provisioned.
        Self::session_file(&layout).save(&session)?;

        tracing::info!(
            "[SessionRegistry] Created session {} ({} '{}')",
            session.id,
            session.persona_type,
            session.persona_name
        );
        Ok(session)
    }

    // ============================================================================
    // Queries
    // ============================================================================

    /// Directories under the root that may hold a session.
    fn candidate_dirs(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("[SessionRegistry] Cannot scan {:?}: {}", self.root, e);
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                !name.starts_with('.')
                    && name != self.config.shared_dir_name
                    && !is_archived_dir_name(&name)
                    && parse_spawn_request_dir_name(&name).is_none()
            })
            .map(|entry| entry.path())
            .collect()
    }

    /// Every live session, oldest first. Unreadable records are skipped.
    pub fn get_all_sessions(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self
            .candidate_dirs()
            .into_iter()
            .filter_map(|dir| {
                let file = AtomicTomlFile::<Session>::new(dir.join(layout::SESSION_FILE));
                match file.load() {
                    Ok(Some(session)) => Some(session),
                    Ok(None) => None,
                    Err(e) => {
                        tracing::warn!("[SessionRegistry] Skipping session in {:?}: {}", dir, e);
                        None
                    }
                }
            })
            .collect();

        sessions.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        sessions
    }

    /// Live sessions with status `active`.
    pub fn get_active_sessions(&self) -> Vec<Session> {
        self.get_all_sessions()
            .into_iter()
            .filter(Session::is_active)
            .collect()
    }

    /// Loads one session.
    ///
    /// # Errors
    ///
    /// `NotFound` when no metadata exists, `Malformed` when it does not parse.
    pub fn get_session(&self, session_id: &str) -> Result<Session> {
        let layout = self.layout(session_id)?;
        Self::session_file(&layout)
            .load()?
            .ok_or_else(|| EnsembleError::not_found("session", session_id))
    }

    /// Case-insensitive lookup of a live session by persona name.
    pub fn find_session_by_name(&self, persona_name: &str) -> Option<Session> {
        let wanted = persona_name.trim();
        self.get_all_sessions()
            .into_iter()
            .find(|s| s.persona_name.eq_ignore_ascii_case(wanted))
    }

    // ============================================================================
    // Updates (read-modify-write, last writer wins)
    // ============================================================================

    fn modify_session<F>(&self, session_id: &str, f: F) -> Result<Session>
    where
        F: FnOnce(&mut Session),
    {
        let layout = self.layout(session_id)?;
        let file = Self::session_file(&layout);
        let mut session = file
            .load()?
            .ok_or_else(|| EnsembleError::not_found("session", session_id))?;
        f(&mut session);
        file.save(&session)?;
        Ok(session)
    }

    pub fn update_session_status(&self, session_id: &str, status: SessionStatus) -> Result<()> {
        let session = self.modify_session(session_id, |s| s.status = status)?;
        tracing::info!("[SessionRegistry] Session {} is now {}", session.id, status);
        Ok(())
    }

    pub fn update_current_work(&self, session_id: &str, current_work: &str) -> Result<()> {
        // One line only.
        let line = current_work.lines().next().unwrap_or("").trim().to_string();
        self.modify_session(session_id, |s| s.current_work = line)?;
        Ok(())
    }

    pub fn update_tmux_binding(&self, session_id: &str, binding: Option<TmuxBinding>) -> Result<()> {
        self.modify_session(session_id, |s| s.tmux = binding)?;
        Ok(())
    }

    pub fn update_pid(&self, session_id: &str, pid: Option<u32>) -> Result<()> {
        self.modify_session(session_id, |s| s.pid = pid)?;
        Ok(())
    }
}

fn system_time_to_utc(time: std::time::SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}
