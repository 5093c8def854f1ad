//! Stale entry sweeps.
//!
//! Staleness is judged on each session's `current` record only. History is
//! never inspected and records are never partially rewritten; a stale session
//! is removed whole.
//!
//! Sweeps keep going past individual failures. A removal that fails is logged
//! and simply not counted, and neither is one whose file was already gone.

use std::collections::HashSet;

use crate::error::Result;
use crate::liveness::{is_process_alive, is_window_valid};
use crate::lock::Locker;
use crate::store::QueueStore;
use crate::types::SessionRecord;

/// Removes entries whose PID is no longer running.
///
/// Returns the number of entries removed.
pub fn clean_by_process<L: Locker>(store: &QueueStore<L>) -> Result<usize> {
    let entries = store.list()?;
    let diag = store.diagnostics();
    diag.trace(format_args!("CLEAN_STALE found {} entries", entries.len()));

    let removed = remove_where(store, &entries, |entry| {
        let alive = is_process_alive(entry.pid);
        diag.trace(format_args!(
            "CLEAN_STALE session={} pid={} alive={}",
            entry.session_id, entry.pid, alive
        ));
        !alive
    });

    if removed > 0 {
        tracing::info!(removed, "Removed entries with dead processes");
    }
    Ok(removed)
}

/// Removes entries whose window is not in `valid_window_ids`.
///
/// Entries without a window id are never removed here: there is nothing to
/// validate them against.
pub fn clean_by_windows<L: Locker>(
    store: &QueueStore<L>,
    valid_window_ids: &HashSet<String>,
) -> Result<usize> {
    let entries = store.list()?;
    let diag = store.diagnostics();

    let removed = remove_where(store, &entries, |entry| {
        let stale = !is_window_valid(&entry.window_id, valid_window_ids);
        if stale {
            diag.trace(format_args!(
                "CLEAN_STALE_WINDOW session={} wid={}",
                entry.session_id, entry.window_id
            ));
        }
        stale
    });

    if removed > 0 {
        tracing::info!(removed, "Removed entries with closed windows");
    }
    Ok(removed)
}

fn remove_where<L: Locker>(
    store: &QueueStore<L>,
    entries: &[SessionRecord],
    mut is_stale: impl FnMut(&SessionRecord) -> bool,
) -> usize {
    let mut removed = 0;
    for entry in entries {
        if !is_stale(entry) {
            continue;
        }
        match store.delete(&entry.session_id) {
            Ok(true) => removed += 1,
            Ok(false) => {
                tracing::debug!(session = %entry.session_id, "Stale entry already removed");
            }
            Err(err) => {
                tracing::warn!(
                    session = %entry.session_id,
                    error = %err,
                    "Failed to remove stale entry"
                );
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::storage::StorageConfig;
    use chrono::Utc;
    use tempfile::{tempdir, TempDir};

    fn store_in(temp: &TempDir) -> QueueStore {
        QueueStore::new(
            StorageConfig::with_root(temp.path().to_path_buf()),
            Diagnostics::disabled(),
        )
    }

    fn record(session_id: &str, pid: i64, window_id: &str) -> SessionRecord {
        SessionRecord {
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
            window_id: window_id.to_string(),
            pid,
            cwd: "/project".to_string(),
            event_kind: "idle_prompt".to_string(),
            ..Default::default()
        }
    }

    fn remaining_ids<L: Locker>(store: &QueueStore<L>) -> Vec<String> {
        let mut ids: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|r| r.session_id)
            .collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_clean_by_process_removes_dead_pid() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store
            .write(record("alive", std::process::id() as i64, "1"))
            .unwrap();
        store.write(record("dead", 999_999_999, "2")).unwrap();

        assert_eq!(clean_by_process(&store).unwrap(), 1);
        assert_eq!(remaining_ids(&store), vec!["alive"]);
    }

    #[test]
    fn test_clean_by_process_removes_zero_pid() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store.write(record("no-pid", 0, "1")).unwrap();

        assert_eq!(clean_by_process(&store).unwrap(), 1);
        assert!(remaining_ids(&store).is_empty());
    }

    #[test]
    fn test_clean_by_process_empty_queue() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        assert_eq!(clean_by_process(&store).unwrap(), 0);
    }

    #[test]
    fn test_clean_by_process_skips_corrupt_files() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store.write(record("dead", 999_999_999, "2")).unwrap();
        std::fs::write(store.config().path_for("corrupt"), "{").unwrap();

        assert_eq!(clean_by_process(&store).unwrap(), 1);
        assert!(store.config().path_for("corrupt").exists());
    }

    #[test]
    fn test_clean_by_windows_keeps_valid_and_untracked() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        let pid = std::process::id() as i64;
        store.write(record("valid", pid, "10")).unwrap();
        store.write(record("closed", pid, "99")).unwrap();
        store.write(record("untracked", pid, "")).unwrap();

        let valid: HashSet<String> = ["10".to_string()].into_iter().collect();
        assert_eq!(clean_by_windows(&store, &valid).unwrap(), 1);
        assert_eq!(remaining_ids(&store), vec!["untracked", "valid"]);
    }

    #[test]
    fn test_clean_by_windows_empty_set_removes_all_tracked() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store.write(record("a", 1, "3")).unwrap();
        store.write(record("b", 1, "4")).unwrap();
        store.write(record("c", 1, "")).unwrap();

        assert_eq!(clean_by_windows(&store, &HashSet::new()).unwrap(), 2);
        assert_eq!(remaining_ids(&store), vec!["c"]);
    }

    #[test]
    fn test_clean_traces_when_enabled() {
        let temp = tempdir().unwrap();
        let config = StorageConfig::with_root(temp.path().to_path_buf());
        let store = QueueStore::new(config.clone(), Diagnostics::new(&config, true));
        store.write(record("dead", 999_999_999, "2")).unwrap();

        clean_by_process(&store).unwrap();

        let log = std::fs::read_to_string(config.debug_log_file()).unwrap();
        assert!(log.contains("CLEAN_STALE found 1 entries"));
        assert!(log.contains("CLEAN_STALE session=dead pid=999999999 alive=false"));
        assert!(log.contains("REMOVE session=dead"));
    }

    #[test]
    fn test_clean_by_process_continues_past_failed_removal() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store.write(record("dead", 999_999_999, "2")).unwrap();
        // A file whose record names "stuck", while stuck.json is a directory.
        let misnamed = crate::codec::encode(&crate::types::SessionFile::new(record(
            "stuck",
            999_999_999,
            "3",
        )))
        .unwrap();
        std::fs::write(store.config().path_for("other"), misnamed).unwrap();
        std::fs::create_dir(store.config().path_for("stuck")).unwrap();

        assert_eq!(clean_by_process(&store).unwrap(), 1);
        assert!(!store.config().path_for("dead").exists());
        assert!(store.config().path_for("other").exists());
    }

    #[test]
    fn test_clean_does_not_count_already_missing_files() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        // Listed under "ghost", but no ghost.json exists to delete.
        let misnamed = crate::codec::encode(&crate::types::SessionFile::new(record(
            "ghost",
            999_999_999,
            "4",
        )))
        .unwrap();
        store.ensure_root().unwrap();
        std::fs::write(store.config().path_for("elsewhere"), misnamed).unwrap();

        assert_eq!(clean_by_process(&store).unwrap(), 0);
        assert_eq!(clean_by_windows(&store, &HashSet::new()).unwrap(), 0);
    }
}
