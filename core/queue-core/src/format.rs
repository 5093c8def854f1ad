//! Display helpers for queue entries.

use std::path::Path;
use std::process::Command;

use chrono::{DateTime, Utc};

use crate::types::SessionRecord;

/// Short display label for an event kind. Unknown kinds are uppercased.
pub fn event_label(event_kind: &str) -> String {
    match event_kind {
        "permission_prompt" => "PERM".to_string(),
        "elicitation_dialog" => "ASK".to_string(),
        "idle_prompt" => "IDLE".to_string(),
        "working" => "WORK".to_string(),
        "SessionStart" => "START".to_string(),
        "SessionEnd" => "END".to_string(),
        other => other.to_uppercase(),
    }
}

/// Returns true if the event means the session is waiting on the user.
pub fn needs_attention(event_kind: &str) -> bool {
    !matches!(event_kind, "" | "working" | "SessionStart" | "SessionEnd")
}

/// Age of `then` relative to `now` as `3s`, `5m` or `2h`.
pub fn format_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(then).num_seconds().max(0);
    match secs {
        s if s < 60 => format!("{}s", s),
        s if s < 3600 => format!("{}m", s / 60),
        s => format!("{}h", s / 3600),
    }
}

/// Replaces a leading `home` with `~`.
pub fn shorten_path(path: &str, home: Option<&Path>) -> String {
    let Some(home) = home.and_then(|h| h.to_str()) else {
        return path.to_string();
    };
    match path.strip_prefix(home) {
        Some(rest) if !home.is_empty() => format!("~{}", rest),
        _ => path.to_string(),
    }
}

/// Current git branch of the repository containing `cwd`.
///
/// `None` outside a repository, on an unborn branch, or when git is missing.
/// A detached HEAD reads as `HEAD`.
pub fn git_branch(cwd: &str) -> Option<String> {
    if cwd.is_empty() {
        return None;
    }
    let output = Command::new("git")
        .args(["-C", cwd, "rev-parse", "--abbrev-ref", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!branch.is_empty()).then_some(branch)
}

/// Entries needing attention first, then newest first. Stable.
pub fn sort_for_picker(records: &mut [SessionRecord]) {
    records.sort_by(|a, b| {
        needs_attention(&b.event_kind)
            .cmp(&needs_attention(&a.event_kind))
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
}

/// Newest first.
pub fn sort_by_newest(records: &mut [SessionRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
