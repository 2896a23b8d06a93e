// Snapshot persistence for Astral Turf
// Versioned JSON snapshots behind a key/value store, with named save slots

pub mod error;
pub mod format;
pub mod manager;
pub mod store;

pub use error::SaveError;
pub use format::{normalize, restore, snapshot_schema, PersistedUi, Snapshot};
pub use manager::{slot_key, SaveManager, ACTIVE_STATE_KEY, SLOT_INDEX_KEY};
pub use store::{is_valid_key, FileStore, MemoryStore, SnapshotStore};
