//! Local record store for offline viewing.
//!
//! Records are kept as serialized JSON keyed by entity type and integer id:
//! - Upserts replace the whole record (no versioning)
//! - Lookups by id and simple field scans work without the network
//! - A full clear is the only way records leave the store

mod storage;
mod traits;

pub use storage::{RecordStore, SqliteStore};
pub use traits::{CachedEntity, Cacheable};
