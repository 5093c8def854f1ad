//! End-to-end coverage of a queue driven by hook input.

use chrono::Utc;
use queue_core::hook::HookInput;
use queue_core::windows::parse_window_ids;
use queue_core::{
    clean_by_process, clean_by_windows, Diagnostics, QueueStore, SessionRecord, StorageConfig,
};
use tempfile::tempdir;

fn record_from_hook(json: &str, window_id: &str, pid: i64) -> SessionRecord {
    let input = HookInput::from_slice(json.as_bytes()).unwrap();
    SessionRecord {
        timestamp: Utc::now(),
        session_id: input.session_id.clone(),
        window_id: window_id.to_string(),
        window_endpoint: String::new(),
        pid,
        cwd: input.cwd.clone(),
        event_kind: input.event_type().to_string(),
        message: input.message().to_string(),
    }
}

#[test]
fn test_hook_events_build_history() {
    let temp = tempdir().unwrap();
    let store = QueueStore::new(
        StorageConfig::with_root(temp.path().to_path_buf()),
        Diagnostics::disabled(),
    );
    let pid = std::process::id() as i64;

    for json in [
        r#"{"session_id":"s1","cwd":"/p","hook_event_name":"SessionStart","matcher":""}"#,
        r#"{"session_id":"s1","cwd":"/p","hook_event_name":"UserPromptSubmit","type":"working"}"#,
        r#"{"session_id":"s1","cwd":"/p","hook_event_name":"UserPromptSubmit","type":"working"}"#,
        r#"{"session_id":"s1","cwd":"/p","hook_event_name":"Notification","notification_type":"permission_prompt","message":"Allow Bash?"}"#,
    ] {
        store.write(record_from_hook(json, "5", pid)).unwrap();
    }

    let session = store.read_session("s1").unwrap();
    assert_eq!(session.current.event_kind, "permission_prompt");
    assert_eq!(session.current.message, "Allow Bash?");
    let history: Vec<_> = session
        .history
        .iter()
        .map(|r| r.event_kind.as_str())
        .collect();
    assert_eq!(history, vec!["working", "SessionStart"]);
}

#[test]
fn test_window_listing_drives_cleanup() {
    let temp = tempdir().unwrap();
    let store = QueueStore::new(
        StorageConfig::with_root(temp.path().to_path_buf()),
        Diagnostics::disabled(),
    );
    let pid = std::process::id() as i64;
    let hook = |id: &str| format!(r#"{{"session_id":"{}","cwd":"/p","hook_event_name":"Stop"}}"#, id);

    store.write(record_from_hook(&hook("open"), "10", pid)).unwrap();
    store.write(record_from_hook(&hook("closed"), "99", pid)).unwrap();
    store.write(record_from_hook(&hook("untracked"), "", pid)).unwrap();
    store.write(record_from_hook(&hook("dead"), "10", 999_999_999)).unwrap();

    let valid = parse_window_ids(br#"[{"tabs":[{"windows":[{"id":10}]}]}]"#).unwrap();
    assert_eq!(clean_by_windows(&store, &valid).unwrap(), 1);
    assert_eq!(clean_by_process(&store).unwrap(), 1);

    let mut ids: Vec<_> = store
        .list()
        .unwrap()
        .into_iter()
        .map(|r| r.session_id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["open", "untracked"]);

    assert_eq!(store.remove_all().unwrap(), 2);
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_legacy_file_readable_and_upgraded() {
    let temp = tempdir().unwrap();
    let config = StorageConfig::with_root(temp.path().to_path_buf());
    let store = QueueStore::new(config.clone(), Diagnostics::disabled());

    std::fs::write(
        config.path_for("old"),
        r#"{
  "timestamp": "2025-01-02T03:04:05.123456789-05:00",
  "session_id": "old",
  "kitty_window_id": "8",
  "pid": 1234,
  "cwd": "/legacy",
  "event": "idle_prompt"
}"#,
    )
    .unwrap();

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].cwd, "/legacy");

    let mut next = listed[0].clone();
    next.event_kind = "working".to_string();
    store.write(next).unwrap();

    let session = store.read_session("old").unwrap();
    assert_eq!(session.current.event_kind, "working");
    assert_eq!(session.history.len(), 1);
    assert_eq!(session.history[0].event_kind, "idle_prompt");
}
