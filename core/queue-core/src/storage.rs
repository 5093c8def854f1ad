//! Storage configuration and path management for cc-queue.
//!
//! All path decisions live here so the store never reads the environment.
//! Production entry points build a config from the state directory; tests use
//! [`StorageConfig::with_root`] with a temp dir.
//!
//! ## Layout
//!
//! ```text
//! <state-root>/cc-queue/
//! ├── <sanitized-session-id>.json   # one SessionFile per session
//! └── debug.log                     # diagnostics trace (opt-in)
//! ```

use std::path::{Path, PathBuf};

/// Directory name appended to the state root.
pub const QUEUE_DIR_NAME: &str = "cc-queue";

/// Extension used by session files. `List` only considers files with it.
pub const SESSION_FILE_EXT: &str = "json";

const DEBUG_LOG_NAME: &str = "debug.log";

/// Central configuration for cc-queue storage paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Queue root directory (default: ~/.local/state/cc-queue)
    root: PathBuf,
}

impl StorageConfig {
    /// Creates a StorageConfig rooted at an explicit queue directory.
    /// Used for testing with temp directories.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Builds the queue root under a state base directory.
    ///
    /// `state_home` is usually `$XDG_STATE_HOME` as read by the binary. When it is
    /// absent or empty, falls back to the per-user state dir, then `~/.local/state`.
    pub fn from_state_home(state_home: Option<PathBuf>) -> Self {
        let base = state_home
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(default_state_dir)
            .unwrap_or_else(|| PathBuf::from(".local/state"));
        Self {
            root: base.join(QUEUE_DIR_NAME),
        }
    }

    /// Returns the queue root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the session file for `session_id`.
    ///
    /// Path separators are replaced so no id can escape the root. Ids that only
    /// differ by `/` vs `\` vs `_` share a file.
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", sanitize_session_id(session_id), SESSION_FILE_EXT))
    }

    /// Path to the diagnostics trace file.
    pub fn debug_log_file(&self) -> PathBuf {
        self.root.join(DEBUG_LOG_NAME)
    }

    /// Returns true if `path` looks like a session file inside the root.
    pub fn is_session_file(&self, path: &Path) -> bool {
        path.parent() == Some(self.root.as_path())
            && path.extension().and_then(|e| e.to_str()) == Some(SESSION_FILE_EXT)
    }
}

/// Replaces `/` and `\` with `_`.
pub fn sanitize_session_id(session_id: &str) -> String {
    session_id.replace(['/', '\\'], "_")
}

fn default_state_dir() -> Option<PathBuf> {
    dirs::state_dir().or_else(|| dirs::home_dir().map(|h| h.join(".local").join("state")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_root_uses_given_dir() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/q"));
        assert_eq!(config.root(), Path::new("/tmp/q"));
        assert_eq!(config.debug_log_file(), PathBuf::from("/tmp/q/debug.log"));
    }

    #[test]
    fn test_from_state_home_appends_queue_dir() {
        let config = StorageConfig::from_state_home(Some(PathBuf::from("/state")));
        assert_eq!(config.root(), Path::new("/state/cc-queue"));
    }

    #[test]
    fn test_from_state_home_empty_falls_back() {
        let config = StorageConfig::from_state_home(Some(PathBuf::new()));
        assert!(config.root().ends_with(QUEUE_DIR_NAME));
        assert_ne!(config.root(), Path::new(QUEUE_DIR_NAME));
    }

    #[test]
    fn test_path_for_plain_id() {
        let config = StorageConfig::with_root(PathBuf::from("/q"));
        assert_eq!(config.path_for("abc-123"), PathBuf::from("/q/abc-123.json"));
    }

    #[test]
    fn test_path_for_strips_separators() {
        let config = StorageConfig::with_root(PathBuf::from("/q"));
        let path = config.path_for("a/b\\c");
        assert_eq!(path, PathBuf::from("/q/a_b_c.json"));
        assert_eq!(path.parent(), Some(Path::new("/q")));
    }

    #[test]
    fn test_path_for_cannot_escape_root() {
        let config = StorageConfig::with_root(PathBuf::from("/q"));
        let path = config.path_for("../../etc/passwd");
        assert_eq!(path.parent(), Some(Path::new("/q")));
    }

    #[test]
    fn test_separator_variants_collide() {
        let config = StorageConfig::with_root(PathBuf::from("/q"));
        assert_eq!(config.path_for("a/b"), config.path_for("a\\b"));
        assert_eq!(config.path_for("a/b"), config.path_for("a_b"));
    }

    #[test]
    fn test_is_session_file() {
        let config = StorageConfig::with_root(PathBuf::from("/q"));
        assert!(config.is_session_file(Path::new("/q/abc.json")));
        assert!(!config.is_session_file(Path::new("/q/debug.log")));
        assert!(!config.is_session_file(Path::new("/other/abc.json")));
    }
}
