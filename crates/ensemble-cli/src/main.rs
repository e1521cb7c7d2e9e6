use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ensemble_core::session::{SessionStatus, TaskStatus};
use ensemble_infrastructure::{ConfigService, EnsemblePaths, SessionRegistry};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "ensemble")]
#[command(about = "Ensemble - session registry and mailboxes for persona workers", long_about = None)]
struct Cli {
    /// Registry root (overrides config.toml and ENSEMBLE_HOME)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a session
    Create {
        /// Persona type, e.g. developer or orchestrator
        persona_type: String,
        /// Display name; omit to have one chosen
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        workspace: Option<String>,
    },
    /// List sessions (active only unless --all)
    List {
        #[arg(long)]
        all: bool,
    },
    /// Show one session
    Show { session_id: String },
    /// Append instructions to a session's mailbox
    Send {
        to: String,
        text: String,
        #[arg(long, default_value = "cli")]
        from: String,
    },
    /// Print and consume new instructions
    Inbox { session_id: String },
    /// Check for updates without consuming them
    Check { session_id: String },
    /// Set a session's status
    Status {
        session_id: String,
        status: SessionStatus,
    },
    /// Show or set what a session is working on
    Work {
        session_id: String,
        /// New one-line status; omit to print the current summary
        text: Option<String>,
    },
    /// Bind a session to a tmux location
    Bind {
        session_id: String,
        tmux_session: Option<String>,
        #[arg(long)]
        window: Option<String>,
        #[arg(long)]
        pane: Option<String>,
        /// Remove the binding
        #[arg(long, conflicts_with = "tmux_session")]
        clear: bool,
    },
    /// Record the worker process id
    Pid {
        session_id: String,
        /// Omit to clear
        pid: Option<u32>,
    },
    /// Task list operations
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Show or record token usage
    Usage {
        session_id: String,
        #[arg(long, requires = "output")]
        input: Option<u64>,
        #[arg(long, requires = "input")]
        output: Option<u64>,
        /// Parse a token report from agent output on stdin
        #[arg(long, conflicts_with_all = ["input", "output"])]
        from_stdin: bool,
        /// Reprice the session against this model
        #[arg(long)]
        model: Option<String>,
    },
    /// Team-wide cost
    Cost,
    /// Ask an external spawner for a new worker
    Request {
        persona_type: String,
        suffix: String,
        text: String,
        #[arg(long, default_value = "cli")]
        from: String,
    },
    /// List pending spawn requests
    Requests,
    /// Suggest an unused persona name
    Name {
        #[arg(long, conflicts_with = "persona")]
        category: Option<String>,
        #[arg(long)]
        persona: Option<String>,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Append a task
    Add {
        session_id: String,
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Set the status of the n-th task (zero based)
    Status {
        session_id: String,
        index: usize,
        status: TaskStatus,
    },
    /// Print the task list
    List { session_id: String },
}

fn init_tracing() {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn open_registry(root: Option<PathBuf>) -> Result<SessionRegistry> {
    let service = ConfigService::new(EnsemblePaths::new(None));
    let config = service.get_config().context("Failed to load configuration")?;
    let root = match root {
        Some(root) => root,
        None => service.registry_root(&config)?,
    };
    SessionRegistry::open(&root, config)
        .with_context(|| format!("Failed to open registry at {}", root.display()))
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let registry = open_registry(cli.root)?;
    let out = commands::Output::new(cli.json);

    match cli.command {
        Commands::Create {
            persona_type,
            name,
            workspace,
        } => commands::session::create(&registry, &out, &persona_type, &name, workspace.as_deref())?,
        Commands::List { all } => commands::session::list(&registry, &out, all)?,
        Commands::Show { session_id } => commands::session::show(&registry, &out, &session_id)?,
        Commands::Send { to, text, from } => {
            commands::mailbox::send(&registry, &out, &from, &to, &text)?
        }
        Commands::Inbox { session_id } => commands::mailbox::inbox(&registry, &out, &session_id)?,
        Commands::Check { session_id } => commands::mailbox::check(&registry, &out, &session_id)?,
        Commands::Status { session_id, status } => {
            commands::session::set_status(&registry, &out, &session_id, status)?
        }
        Commands::Work { session_id, text } => {
            commands::session::work(&registry, &out, &session_id, text.as_deref())?
        }
        Commands::Bind {
            session_id,
            tmux_session,
            window,
            pane,
            clear,
        } => commands::session::bind(
            &registry,
            &out,
            &session_id,
            if clear { None } else { tmux_session },
            window,
            pane,
        )?,
        Commands::Pid { session_id, pid } => commands::session::pid(&registry, &out, &session_id, pid)?,
        Commands::Task { action } => match action {
            TaskAction::Add {
                session_id,
                title,
                description,
            } => commands::tasks::add(&registry, &out, &session_id, &title, description.as_deref())?,
            TaskAction::Status {
                session_id,
                index,
                status,
            } => commands::tasks::set_status(&registry, &out, &session_id, index, status)?,
            TaskAction::List { session_id } => commands::tasks::list(&registry, &out, &session_id)?,
        },
        Commands::Usage {
            session_id,
            input,
            output,
            from_stdin,
            model,
        } => {
            let update = match (input, output) {
                (Some(input), Some(output)) => commands::usage::UsageUpdate::Counts(input, output),
                _ if from_stdin => commands::usage::UsageUpdate::FromStdin,
                _ => commands::usage::UsageUpdate::None,
            };
            commands::usage::usage(&registry, &out, &session_id, update, model.as_deref())?
        }
        Commands::Cost => commands::usage::cost(&registry, &out)?,
        Commands::Request {
            persona_type,
            suffix,
            text,
            from,
        } => commands::spawn::request(&registry, &out, &persona_type, &suffix, &from, &text)?,
        Commands::Requests => commands::spawn::list(&registry, &out)?,
        Commands::Name { category, persona } => {
            commands::session::name(&registry, &out, category.as_deref(), persona.as_deref())?
        }
    }

    Ok(())
}
