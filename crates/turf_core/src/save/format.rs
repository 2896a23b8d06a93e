//! Snapshot format
//!
//! A snapshot is the persisted subset of [`RootState`]: tactics, franchise
//! (minus transient workflow fields) and a handful of UI preferences, tagged
//! with the app version that wrote it. Maps are ordered, so the same state
//! always serializes to the same bytes.

use std::collections::BTreeMap;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::error::SaveError;
use crate::geometry::TeamView;
use crate::models::{
    AuthState, DrawingTool, FranchiseState, PlayerId, PositioningMode, SaveSlot, Sided, TeamKit,
    Theme, Tutorial, UiState,
};
use crate::playbook::sequencer::at_rest;
use crate::state::{RootState, TacticsState};

/// UI fields that survive a reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersistedUi {
    pub theme: Theme,
    pub save_slots: BTreeMap<String, SaveSlot>,
    pub active_save_slot_id: Option<String>,
    pub team_kits: Sided<TeamKit>,
    pub active_team_context: TeamView,
    pub selected_player_id: Option<PlayerId>,
    pub tutorial: Tutorial,
    pub drawing_tool: DrawingTool,
    pub drawing_color: String,
    pub positioning_mode: PositioningMode,
    pub active_playbook_item_id: Option<String>,
    pub active_step_index: Option<usize>,
}

impl From<&UiState> for PersistedUi {
    fn from(ui: &UiState) -> Self {
        Self {
            theme: ui.theme,
            save_slots: ui.save_slots.clone(),
            active_save_slot_id: ui.active_save_slot_id.clone(),
            team_kits: ui.team_kits.clone(),
            active_team_context: ui.active_team_context,
            selected_player_id: ui.selected_player_id.clone(),
            tutorial: ui.tutorial,
            drawing_tool: ui.drawing_tool,
            drawing_color: ui.drawing_color.clone(),
            positioning_mode: ui.positioning_mode,
            active_playbook_item_id: ui.active_playbook_item_id.clone(),
            active_step_index: ui.active_step_index,
        }
    }
}

impl PersistedUi {
    /// Full UI state; transient fields take their defaults.
    pub fn into_ui(self) -> UiState {
        UiState {
            theme: self.theme,
            save_slots: self.save_slots,
            active_save_slot_id: self.active_save_slot_id,
            team_kits: self.team_kits,
            active_team_context: self.active_team_context,
            selected_player_id: self.selected_player_id,
            tutorial: self.tutorial,
            drawing_tool: self.drawing_tool,
            drawing_color: self.drawing_color,
            positioning_mode: self.positioning_mode,
            active_playbook_item_id: self.active_playbook_item_id,
            active_step_index: self.active_step_index,
            ..UiState::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Snapshot {
    pub version: String,
    pub tactics: TacticsState,
    pub franchise: FranchiseState,
    pub ui: PersistedUi,
}

#[derive(Deserialize)]
struct VersionHeader {
    version: String,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a snapshot written by `expected`. The version is checked before
    /// the body so a foreign layout reports a mismatch, not a parse error.
    pub fn from_json(json: &str, expected: &str) -> Result<Self, SaveError> {
        let header: VersionHeader = serde_json::from_str(json)?;
        if header.version != expected {
            return Err(SaveError::VersionMismatch { found: header.version, expected: expected.to_string() });
        }
        Ok(serde_json::from_str(json)?)
    }
}

/// Snapshot of `state` at rest: playback is stopped (players back at their
/// pre-playback spots), live edits are baked into the active step and
/// transient franchise fields are dropped.
pub fn normalize(state: &RootState, version: &str) -> Snapshot {
    let rested = at_rest(state);
    let mut franchise = (*rested.franchise).clone();
    franchise.last_match_result = None;
    franchise.negotiation_data = None;

    Snapshot {
        version: version.to_string(),
        tactics: (*rested.tactics).clone(),
        franchise,
        ui: PersistedUi::from(&*rested.ui),
    }
}

/// Rebuild a root state from `snapshot`, keeping `auth`. A play-head
/// pointing at a missing item or step is repaired.
pub fn restore(snapshot: &Snapshot, auth: &Arc<AuthState>) -> RootState {
    let mut ui = snapshot.ui.clone().into_ui();
    let item = ui.active_playbook_item_id.as_ref().and_then(|id| snapshot.tactics.playbook.get(id));
    match item {
        Some(item) if !item.steps.is_empty() => {
            let last = item.steps.len() - 1;
            ui.active_step_index = Some(ui.active_step_index.unwrap_or(0).min(last));
        }
        _ => {
            ui.active_playbook_item_id = None;
            ui.active_step_index = None;
        }
    }

    RootState {
        auth: auth.clone(),
        tactics: Arc::new(snapshot.tactics.clone()),
        franchise: Arc::new(snapshot.franchise.clone()),
        ui: Arc::new(ui),
    }
}

/// JSON schema of the snapshot layout
pub fn snapshot_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(Snapshot)
}
