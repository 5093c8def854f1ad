//! Opt-in append-only trace of store operations.
//!
//! Lines go to `<queue root>/debug.log` as `<local time>  <message>`. Tracing is
//! best-effort: failures to open or write the file are swallowed so a hook
//! invocation is never slowed or failed by diagnostics.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use fs_err::OpenOptions;

use crate::storage::StorageConfig;

/// Environment flag the binary reads to enable tracing.
pub const DEBUG_ENV: &str = "CC_QUEUE_DEBUG";

/// Diagnostic trace sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    log_file: Option<PathBuf>,
}

impl Diagnostics {
    pub fn disabled() -> Self {
        Diagnostics { log_file: None }
    }

    /// Traces into the queue root of `config` when `enabled`.
    pub fn new(config: &StorageConfig, enabled: bool) -> Self {
        Diagnostics {
            log_file: enabled.then(|| config.debug_log_file()),
        }
    }

    /// Interprets a raw flag value the way the binary reads [`DEBUG_ENV`]: any
    /// non-empty value enables tracing.
    pub fn flag_enabled(value: Option<&str>) -> bool {
        value.is_some_and(|v| !v.is_empty())
    }

    pub fn is_enabled(&self) -> bool {
        self.log_file.is_some()
    }

    /// Appends one timestamped line. No-op when disabled.
    pub fn trace(&self, args: fmt::Arguments<'_>) {
        let Some(log_file) = &self.log_file else {
            return;
        };

        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f");
        let line = format!("{}  {}\n", timestamp, args);

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_file) {
            let _ = file.write_all(line.as_bytes());
        }
    }
}
