//! Save manager
//!
//! Keys written to the store:
//! - `astral_turf_active_state`: the autosaved working snapshot
//! - `astral_turf_save_<id>`: one snapshot per named slot
//! - `astral_turf_save_slots`: slot index (`id -> SaveSlot`)

use std::collections::BTreeMap;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::error::SaveError;
use super::format::{normalize, Snapshot};
use super::store::{is_valid_key, SnapshotStore};
use crate::config::APP_VERSION;
use crate::models::SaveSlot;
use crate::state::RootState;

pub const ACTIVE_STATE_KEY: &str = "astral_turf_active_state";
pub const SLOT_INDEX_KEY: &str = "astral_turf_save_slots";

pub fn slot_key(slot_id: &str) -> String {
    format!("astral_turf_save_{}", slot_id)
}

pub struct SaveManager<S: SnapshotStore> {
    store: S,
    version: String,
}

impl<S: SnapshotStore> SaveManager<S> {
    pub fn new(store: S) -> Self {
        Self::with_version(store, APP_VERSION)
    }

    /// Manager stamping and accepting `version` instead of [`APP_VERSION`].
    pub fn with_version(store: S, version: &str) -> Self {
        Self { store, version: version.to_string() }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Write the working snapshot and, when a slot is active, that slot too.
    pub fn persist(&mut self, state: &RootState) -> Result<(), SaveError> {
        let snapshot = normalize(state, &self.version);
        let json = snapshot.to_json()?;
        self.store.write(ACTIVE_STATE_KEY, &json)?;

        let active_slot = state.ui.active_save_slot_id.as_deref().filter(|id| {
            let valid = is_valid_key(id);
            if !valid {
                log::warn!("Skipping save slot with invalid id {:?}", id);
            }
            valid
        });
        if let Some(slot_id) = active_slot {
            self.store.write(&slot_key(slot_id), &json)?;

            let mut index = self.read_index().unwrap_or_else(|e| {
                log::warn!("Rebuilding save slot index: {}", e);
                BTreeMap::new()
            });
            let name = state.ui.save_slots.get(slot_id).map_or_else(|| slot_id.to_string(), |s| s.name.clone());
            index.insert(
                slot_id.to_string(),
                SaveSlot {
                    id: slot_id.to_string(),
                    name,
                    last_saved: OffsetDateTime::now_utc().format(&Rfc3339)?,
                    app_version: self.version.clone(),
                },
            );
            self.write_index(&index)?;
            log::info!("Saved slot {}", slot_id);
        }

        log::debug!("Persisted {} bytes", json.len());
        Ok(())
    }

    /// Working snapshot, if one exists for this version.
    pub fn load_active(&mut self) -> Result<Option<Snapshot>, SaveError> {
        self.read_snapshot(ACTIVE_STATE_KEY)
    }

    pub fn load_slot(&mut self, slot_id: &str) -> Result<Snapshot, SaveError> {
        if !self.read_index()?.contains_key(slot_id) {
            return Err(SaveError::UnknownSlot(slot_id.to_string()));
        }
        let snapshot = self
            .read_snapshot(&slot_key(slot_id))?
            .ok_or_else(|| SaveError::UnknownSlot(slot_id.to_string()))?;
        log::info!("Loaded slot {}", slot_id);
        Ok(snapshot)
    }

    /// Remove a slot snapshot and its index entry. `false` if it did not exist.
    pub fn delete_slot(&mut self, slot_id: &str) -> Result<bool, SaveError> {
        let mut index = self.read_index()?;
        let existed = index.remove(slot_id).is_some();
        self.store.remove(&slot_key(slot_id))?;
        if existed {
            self.write_index(&index)?;
            log::info!("Deleted save slot {}", slot_id);
        }
        Ok(existed)
    }

    /// Slot index entries, most recently saved first.
    pub fn list_slots(&self) -> Result<Vec<SaveSlot>, SaveError> {
        let mut slots: Vec<SaveSlot> = self.read_index()?.into_values().collect();
        slots.sort_by_key(|s| std::cmp::Reverse(OffsetDateTime::parse(&s.last_saved, &Rfc3339).ok()));
        Ok(slots)
    }

    /// Snapshot under `key`. A snapshot from another version is discarded
    /// (logged and removed) and reads as `None`.
    pub fn read_snapshot(&mut self, key: &str) -> Result<Option<Snapshot>, SaveError> {
        let Some(json) = self.store.read(key)? else {
            return Ok(None);
        };
        match Snapshot::from_json(&json, &self.version) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(SaveError::VersionMismatch { found, expected }) => {
                log::warn!("Discarding {} written by {} (current {})", key, found, expected);
                self.store.remove(key)?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn read_index(&self) -> Result<BTreeMap<String, SaveSlot>, SaveError> {
        match self.store.read(SLOT_INDEX_KEY)? {
            None => Ok(BTreeMap::new()),
            Some(json) => serde_json::from_str(&json).map_err(|e| SaveError::CorruptedIndex(e.to_string())),
        }
    }

    fn write_index(&mut self, index: &BTreeMap<String, SaveSlot>) -> Result<(), SaveError> {
        self.store.write(SLOT_INDEX_KEY, &serde_json::to_string_pretty(index)?)
    }
}
