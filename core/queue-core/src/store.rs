//! File-backed session queue persistence.
//!
//! One JSON file per session under the queue root (see [`crate::storage`]).
//! Hook processes are independent and short-lived, so all coordination goes
//! through the filesystem:
//!
//! - **Writes** run a read-modify-write cycle under an exclusive lock of the
//!   session file. Concurrent writers for one session are fully serialized and
//!   each sees the previous writer's result.
//! - **Reads, listing and removal** take no lock. A reader racing a writer may
//!   see an empty or partial file; that is "temporarily unavailable", never
//!   corruption.
//!
//! # Defensive Design
//!
//! - Empty file on write → treated as no prior record
//! - Corrupt file on write → error, file left untouched
//! - Corrupt file during [`QueueStore::list`] → skipped, rest still listed
//! - Missing queue root → empty listing

use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use fs_err as fs;
use fs_err::OpenOptions;
use walkdir::WalkDir;

use crate::codec::{self, DecodeError};
use crate::diagnostics::Diagnostics;
use crate::error::{QueueError, Result};
use crate::lock::{FlockLocker, LockGuard, Locker};
use crate::storage::StorageConfig;
use crate::types::{SessionFile, SessionRecord};

/// Session queue rooted at one directory.
///
/// Create with [`QueueStore::new`] for real `flock` locking, or
/// [`QueueStore::with_locker`] to inject a different [`Locker`].
#[derive(Debug)]
pub struct QueueStore<L: Locker = FlockLocker> {
    config: StorageConfig,
    diagnostics: Diagnostics,
    locker: L,
}

impl QueueStore<FlockLocker> {
    pub fn new(config: StorageConfig, diagnostics: Diagnostics) -> Self {
        Self::with_locker(config, diagnostics, FlockLocker)
    }
}

impl<L: Locker> QueueStore<L> {
    pub fn with_locker(config: StorageConfig, diagnostics: Diagnostics, locker: L) -> Self {
        QueueStore {
            config,
            diagnostics,
            locker,
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Creates the queue root if it doesn't exist.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(self.config.root())
            .map_err(|e| QueueError::io("creating queue directory", e))
    }

    /// Makes `record` the current state of its session.
    ///
    /// The previous current moves to history unless it carries the same
    /// `(event, message)` pair. Blocks until the session lock is available.
    pub fn write(&self, record: SessionRecord) -> Result<()> {
        self.ensure_root()?;

        let path = self.config.path_for(&record.session_id);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| QueueError::io("opening session file", e))?;

        let _guard = LockGuard::acquire(&self.locker, file.file()).map_err(|source| {
            QueueError::Lock {
                path: path.clone(),
                source,
            }
        })?;

        let mut handle = file.file();

        let mut existing = Vec::new();
        handle
            .read_to_end(&mut existing)
            .map_err(|e| QueueError::io(format!("reading {}", path.display()), e))?;

        let prior = match codec::decode(&existing) {
            Ok(session) => Some(session),
            Err(DecodeError::Empty) => None,
            Err(DecodeError::Malformed(details)) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %details,
                    "Refusing to overwrite malformed session file"
                );
                return Err(QueueError::MalformedRecord { path, details });
            }
        };

        let trace = format!(
            "WRITE session={} event={} cwd={} pid={} wid={}",
            record.session_id, record.event_kind, record.cwd, record.pid, record.window_id
        );

        let session = SessionFile::advance(prior, record);
        let bytes = codec::encode(&session)?;

        replace_contents(handle, &bytes)
            .map_err(|e| QueueError::io(format!("writing {}", path.display()), e))?;

        tracing::debug!(
            session = %session.current.session_id,
            event = %session.current.event_kind,
            history = session.history.len(),
            "Session written"
        );
        self.diagnostics.trace(format_args!("{}", trace));
        Ok(())
    }

    /// Reads the full session file (current + history). Unlocked.
    ///
    /// A missing or empty file is [`QueueError::NotFound`].
    pub fn read_session(&self, session_id: &str) -> Result<SessionFile> {
        let path = self.config.path_for(session_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(QueueError::NotFound {
                    session_id: session_id.to_string(),
                })
            }
            Err(e) => return Err(QueueError::io("reading session file", e)),
        };

        codec::decode(&bytes).map_err(|err| match err {
            DecodeError::Empty => QueueError::NotFound {
                session_id: session_id.to_string(),
            },
            DecodeError::Malformed(details) => QueueError::MalformedRecord { path, details },
        })
    }

    /// Reads only the current record of a session.
    pub fn read_current(&self, session_id: &str) -> Result<SessionRecord> {
        self.read_session(session_id).map(|session| session.current)
    }

    /// Returns the current record of every session. Order is unspecified.
    ///
    /// Files that fail to read or decode are skipped.
    pub fn list(&self) -> Result<Vec<SessionRecord>> {
        let records = self
            .session_files()?
            .into_iter()
            .filter_map(|path| {
                let bytes = match fs::read(&path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::debug!(error = %e, "Skipping unreadable session file");
                        return None;
                    }
                };
                match codec::decode(&bytes) {
                    Ok(session) => Some(session.current),
                    Err(err) => {
                        tracing::debug!(
                            path = %path.display(),
                            error = %err,
                            "Skipping undecodable session file"
                        );
                        None
                    }
                }
            })
            .collect();
        Ok(records)
    }

    /// Deletes a session file. Removing an absent session is not an error.
    pub fn remove(&self, session_id: &str) -> Result<()> {
        self.delete(session_id).map(|_| ())
    }

    /// Like [`remove`](Self::remove), but reports whether a file was actually
    /// deleted. Sweeps count only `true`.
    pub fn delete(&self, session_id: &str) -> Result<bool> {
        self.diagnostics
            .trace(format_args!("REMOVE session={}", session_id));

        match fs::remove_file(self.config.path_for(session_id)) {
            Ok(()) => {
                tracing::debug!(session = %session_id, "Session removed");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(QueueError::io("removing session file", e)),
        }
    }

    /// Deletes every session file, continuing past individual failures.
    ///
    /// Returns how many files were removed.
    pub fn remove_all(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.session_files()? {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(error = %e, "Failed to remove session file"),
            }
        }
        Ok(removed)
    }

    /// Lists session files directly under the root.
    fn session_files(&self) -> Result<Vec<PathBuf>> {
        let root = self.config.root();
        if !root.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("walking queue directory"));
                    return Err(QueueError::io(
                        format!("listing {}", root.display()),
                        source,
                    ));
                }
                Err(err) => {
                    tracing::debug!(error = %err, "Skipping queue entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && self.config.is_session_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

/// Truncates and rewrites `file` in place. Caller holds the lock.
fn replace_contents(mut file: &std::fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(0))?;
    file.set_len(0)?;
    file.write_all(bytes)?;
    file.flush()
}
