//! Subcommand implementations.
//!
//! Each command is one or two store calls plus output formatting. Inputs that
//! come from the environment arrive in [`HookContext`]; output goes to a
//! caller-supplied writer so tests can capture it.

use std::collections::HashSet;
use std::io::{self, Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use queue_core::format::{event_label, format_age, shorten_path, sort_for_picker};
use queue_core::windows::parse_window_ids;
use queue_core::{
    clean_by_process, clean_by_windows, HookInput, Locker, QueueError, QueueStore, SessionRecord,
};
use thiserror::Error;

/// Longest history message shown by `show` before eliding.
const HISTORY_MESSAGE_WIDTH: usize = 60;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type CliResult = Result<(), CliError>;

/// Values a hook invocation reads from its environment.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Window running the agent. `None` when not inside the terminal.
    pub window_id: Option<String>,
    pub window_endpoint: String,
    pub pid: u32,
    pub now: DateTime<Utc>,
}

/// Records the hook event on stdin as the session's current state.
pub fn push<L: Locker>(store: &QueueStore<L>, ctx: &HookContext, stdin: impl Read) -> CliResult {
    let Some(window_id) = ctx.window_id.as_deref().filter(|id| !id.is_empty()) else {
        store
            .diagnostics()
            .trace(format_args!("PUSH skip: KITTY_WINDOW_ID not set"));
        return Ok(());
    };

    let input = HookInput::parse(stdin)?;
    if input.session_id.is_empty() {
        tracing::debug!(event = %input.hook_event_name, "Skipping event (missing session_id)");
        return Ok(());
    }

    let record = SessionRecord {
        timestamp: ctx.now,
        session_id: input.session_id.clone(),
        window_id: window_id.to_string(),
        window_endpoint: ctx.window_endpoint.clone(),
        pid: i64::from(ctx.pid),
        cwd: input.cwd.clone(),
        event_kind: input.event_type().to_string(),
        message: input.message().to_string(),
    };

    store.diagnostics().trace(format_args!(
        "PUSH session={} event={} pid={}",
        record.session_id, record.event_kind, record.pid
    ));
    store.write(record)?;

    if let Err(err) = clean_by_process(store) {
        tracing::warn!(error = %err, "Opportunistic cleanup failed");
    }
    Ok(())
}

/// Removes the session named by the hook event on stdin.
///
/// `trace_end` marks removals driven by the session-end hook.
pub fn pop<L: Locker>(store: &QueueStore<L>, stdin: impl Read, trace_end: bool) -> CliResult {
    let input = HookInput::parse(stdin)?;
    if trace_end {
        store
            .diagnostics()
            .trace(format_args!("END session={}", input.session_id));
    }
    store.remove(&input.session_id)?;
    Ok(())
}

/// Prints one row per session, attention-needing first.
///
/// `branch_of` maps a working directory to its branch; rows without one show
/// `-`.
pub fn list<L: Locker>(
    store: &QueueStore<L>,
    now: DateTime<Utc>,
    home: Option<&Path>,
    branch_of: impl Fn(&str) -> Option<String>,
    out: &mut impl Write,
) -> CliResult {
    let mut entries = store.list()?;
    if entries.is_empty() {
        writeln!(out, "No active sessions")?;
        return Ok(());
    }

    sort_for_picker(&mut entries);
    let rows: Vec<_> = entries
        .iter()
        .map(|e| {
            (
                format_age(e.timestamp, now),
                event_label(&e.event_kind),
                shorten_path(&e.cwd, home),
                branch_of(&e.cwd).unwrap_or_else(|| "-".to_string()),
            )
        })
        .collect();
    let path_width = rows
        .iter()
        .map(|(_, _, path, _)| path.len())
        .max()
        .unwrap_or(0)
        .max("PATH".len());
    let branch_width = rows
        .iter()
        .map(|(_, _, _, branch)| branch.len())
        .max()
        .unwrap_or(0)
        .max("BRANCH".len());

    writeln!(
        out,
        "{:<5} {:<5}  {:<pw$}  {:<bw$}  SESSION",
        "AGE",
        "EVENT",
        "PATH",
        "BRANCH",
        pw = path_width,
        bw = branch_width
    )?;
    for ((age, label, path, branch), entry) in rows.iter().zip(&entries) {
        writeln!(
            out,
            "{:<5} {:<5}  {:<pw$}  {:<bw$}  {}",
            age,
            label,
            path,
            branch,
            entry.session_id,
            pw = path_width,
            bw = branch_width
        )?;
    }
    Ok(())
}

/// Prints the current state and recent activity of one session.
pub fn show<L: Locker>(
    store: &QueueStore<L>,
    session_id: &str,
    now: DateTime<Utc>,
    home: Option<&Path>,
    out: &mut impl Write,
) -> CliResult {
    let session = match store.read_session(session_id) {
        Ok(session) => session,
        Err(err) if err.is_not_found() => {
            writeln!(out, "No entry for session {}", session_id)?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let current = &session.current;
    writeln!(
        out,
        "{}  {}  {}\n",
        event_label(&current.event_kind),
        format_age(current.timestamp, now),
        shorten_path(&current.cwd, home)
    )?;
    if !current.message.is_empty() {
        writeln!(out, "{}", current.message)?;
    }

    if !session.history.is_empty() {
        writeln!(out)?;
        writeln!(out, "── Recent activity ──")?;
        for entry in &session.history {
            writeln!(
                out,
                "{:>5}  {:<5}  {}",
                format_age(entry.timestamp, now),
                event_label(&entry.event_kind),
                elide(&entry.message, HISTORY_MESSAGE_WIDTH)
            )?;
        }
    }
    Ok(())
}

pub fn clear<L: Locker>(store: &QueueStore<L>, out: &mut impl Write) -> CliResult {
    store.remove_all()?;
    writeln!(out, "Queue cleared")?;
    Ok(())
}

/// Removes entries with dead processes, and with closed windows when a
/// listing is given (`-` reads it from stdin).
pub fn clean<L: Locker>(
    store: &QueueStore<L>,
    windows: Option<&Path>,
    stdin: impl Read,
    out: &mut impl Write,
) -> CliResult {
    let mut removed = clean_by_process(store)?;

    if let Some(source) = windows {
        let valid = read_window_ids(source, stdin)?;
        removed += clean_by_windows(store, &valid)?;
    }

    writeln!(out, "Removed {} stale entries", removed)?;
    Ok(())
}

fn read_window_ids(source: &Path, mut stdin: impl Read) -> Result<HashSet<String>, CliError> {
    let bytes = if source == Path::new("-") {
        let mut buf = Vec::new();
        stdin.read_to_end(&mut buf)?;
        buf
    } else {
        fs_err::read(source)?
    };
    Ok(parse_window_ids(&bytes)?)
}

fn elide(message: &str, width: usize) -> String {
    if message.chars().count() <= width {
        return message.to_string();
    }
    let kept: String = message.chars().take(width - 3).collect();
    format!("{}...", kept)
}
