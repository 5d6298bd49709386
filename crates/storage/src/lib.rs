//! statecase-storage: persistence for diagram versions.
//!
//! [`Store`] is the injected key-value backend; [`MemoryStore`] and
//! [`FileStore`] are the bundled implementations. [`VersionStore`] layers the
//! per-application, retention-bounded version history on top of any of them.

pub mod conformance;
mod error;
mod file;
mod memory;
mod record;
mod traits;
mod versions;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::{content_hash, SaveOutcome, TrimFailure, VersionRecord};
pub use traits::{Store, StoreLock};
pub use versions::{Clock, SystemClock, VersionStore, DEFAULT_NAMESPACE, DEFAULT_RETENTION};
