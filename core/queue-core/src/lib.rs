//! # queue-core
//!
//! Session queue for cc-queue: one state file per agent session, written by
//! short-lived hook processes and read by the list/jump entry points.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. Every call is one bounded filesystem operation.
//! - **Filesystem is the coordinator**: Independent processes share nothing but the
//!   queue directory. Writers to one session serialize on a file lock.
//! - **Graceful degradation**: One corrupt session file never hides or blocks the rest.
//! - **No ambient environment**: Paths and flags arrive through [`StorageConfig`] and
//!   [`Diagnostics`]. Only the binary reads environment variables.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use queue_core::{Diagnostics, QueueStore, StorageConfig};
//!
//! let config = StorageConfig::from_state_home(std::env::var_os("XDG_STATE_HOME").map(Into::into));
//! let store = QueueStore::new(config, Diagnostics::disabled());
//! for entry in store.list()? {
//!     println!("{} {}", entry.session_id, entry.event_kind);
//! }
//! ```

pub mod cleanup;
pub mod codec;
pub mod diagnostics;
pub mod error;
pub mod format;
pub mod hook;
pub mod liveness;
pub mod lock;
pub mod storage;
pub mod store;
pub mod types;
pub mod windows;

pub use cleanup::{clean_by_process, clean_by_windows};
pub use diagnostics::Diagnostics;
pub use error::{QueueError, Result};
pub use hook::HookInput;
pub use lock::{FlockLocker, Locker, NoopLocker};
pub use storage::StorageConfig;
pub use store::QueueStore;
pub use types::{SessionFile, SessionRecord, MAX_HISTORY};
