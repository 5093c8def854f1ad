//! cc-queue: session queue for agents running in terminal windows.
//!
//! Called directly by agent hooks configured in the agent's settings file, and
//! by the user to inspect or tidy the queue.
//!
//! ## Subcommands
//!
//! - `push`: Record the hook event on stdin as the session's current state
//! - `pop` / `end`: Remove the session named by the hook event on stdin
//! - `list`, `show`: Inspect the queue
//! - `clear`, `clean`: Remove all or stale entries
//!
//! This is the only place environment variables are read. Everything the
//! library needs is passed in explicitly.

mod commands;
mod logging;

use std::env;
use std::io;
use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use queue_core::diagnostics::DEBUG_ENV;
use queue_core::format::git_branch;
use queue_core::liveness::ancestor_pid;
use queue_core::{Diagnostics, QueueStore, StorageConfig};

use crate::commands::HookContext;

const STATE_HOME_ENV: &str = "XDG_STATE_HOME";
const WINDOW_ID_ENV: &str = "KITTY_WINDOW_ID";
const WINDOW_ENDPOINT_ENV: &str = "KITTY_LISTEN_ON";

#[derive(Parser)]
#[command(name = "cc-queue")]
#[command(about = "Queue of agent sessions waiting for input")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add or update a session entry (called by hooks, reads JSON from stdin)
    Push {
        /// Process tree hops from cc-queue to the process to watch for liveness
        /// (2 skips the hook's shell and lands on the agent)
        #[arg(long, default_value_t = 2, value_name = "N")]
        ancestor_hops: usize,
    },

    /// Remove a session entry (called by hooks, reads JSON from stdin)
    Pop,

    /// Remove a session entry on exit (called by the SessionEnd hook)
    #[command(hide = true)]
    End,

    /// List all active sessions
    List,

    /// Show one session with its recent activity
    Show {
        #[arg(value_name = "SESSION_ID")]
        session_id: String,
    },

    /// Remove all entries
    Clear,

    /// Remove stale entries (dead processes, and closed windows with --windows)
    Clean {
        /// Window listing JSON from the terminal's `ls` (`-` for stdin)
        #[arg(long, value_name = "FILE")]
        windows: Option<PathBuf>,
    },
}

fn main() {
    let debug = Diagnostics::flag_enabled(env::var(DEBUG_ENV).ok().as_deref());
    let logging_guard = logging::init(debug);
    let cli = Cli::parse();

    let config = StorageConfig::from_state_home(env::var_os(STATE_HOME_ENV).map(PathBuf::from));
    let diagnostics = Diagnostics::new(&config, debug);
    let store = QueueStore::new(config, diagnostics);

    let now = Utc::now();
    let home = dirs::home_dir();
    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();

    let result = match cli.command {
        Commands::Push { ancestor_hops } => {
            let ctx = HookContext {
                window_id: env::var(WINDOW_ID_ENV).ok(),
                window_endpoint: env::var(WINDOW_ENDPOINT_ENV).unwrap_or_default(),
                pid: ancestor_pid(ancestor_hops),
                now,
            };
            commands::push(&store, &ctx, stdin)
        }
        Commands::Pop => commands::pop(&store, stdin, false),
        Commands::End => commands::pop(&store, stdin, true),
        Commands::List => {
            commands::list(&store, now, home.as_deref(), git_branch, &mut stdout)
        }
        Commands::Show { session_id } => {
            commands::show(&store, &session_id, now, home.as_deref(), &mut stdout)
        }
        Commands::Clear => commands::clear(&store, &mut stdout),
        Commands::Clean { windows } => {
            commands::clean(&store, windows.as_deref(), stdin, &mut stdout)
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "cc-queue failed");
        eprintln!("error: {}", e);
        drop(logging_guard);
        std::process::exit(1);
    }
}
