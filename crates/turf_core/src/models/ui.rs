//! UI / session state
//!
//! Most of this tree is transient. The persisted subset is chosen in
//! `save::format::PersistedUi`; everything else falls back to `Default` on reload.

use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::drawing::DrawingTool;
use super::formation::RoleCategory;
use super::playbook::PlayCategory;
use super::player::PlayerId;
use super::Sided;
use crate::geometry::{PitchPos, TeamView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PositioningMode {
    Free,
    #[default]
    Snap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ModalType {
    EditPlayer,
    ComparePlayer,
    SlotActionMenu,
    Chat,
    CustomFormationEditor,
    LoadProject,
    PlaybookLibrary,
    InteractiveTutorial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamKit {
    pub primary_color: String,
    pub secondary_color: String,
}

impl TeamKit {
    fn home() -> Self {
        Self { primary_color: "#2563eb".into(), secondary_color: "#ffffff".into() }
    }

    fn away() -> Self {
        Self { primary_color: "#dc2626".into(), secondary_color: "#ffffff".into() }
    }
}

/// Named save slot metadata. Doubles as the storage index entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveSlot {
    pub id: String,
    pub name: String,
    pub last_saved: String,
    pub app_version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuTrigger {
    Click,
    Drag,
}

/// Screen coordinate where the menu pops up. Owned by rendering.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPos {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotActionMenu {
    pub source_player_id: PlayerId,
    pub target_slot_id: String,
    #[serde(default)]
    pub target_player_id: Option<PlayerId>,
    pub trigger: MenuTrigger,
    pub position: ScreenPos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trail {
    pub player_id: PlayerId,
    pub points: Vec<PitchPos>,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tutorial {
    pub is_active: bool,
    pub step: u32,
}

/// Loan decision from the slot menu, waiting for the franchise workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    pub player_id: PlayerId,
}

/// External AI provider channels. Payloads are opaque JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AiChannel {
    Insight,
    Comparison,
    FormationSuggestion,
    Chat,
    OppositionReport,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiState {
    pub pending: BTreeSet<AiChannel>,
    pub results: BTreeMap<AiChannel, serde_json::Value>,
    pub chat_history: Vec<serde_json::Value>,
}

impl AiState {
    pub fn is_loading(&self, channel: AiChannel) -> bool {
        self.pending.contains(&channel)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    // persisted
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

    // transient
    pub active_modal: Option<ModalType>,
    pub editing_player_id: Option<PlayerId>,
    pub player_to_compare_id: Option<PlayerId>,
    pub slot_action_menu: Option<SlotActionMenu>,
    pub pending_loan_request: Option<LoanRequest>,
    pub notifications: Vec<Notification>,
    pub is_grid_visible: bool,
    pub is_formation_strength_visible: bool,
    pub is_presentation_mode: bool,
    pub is_exporting_lineup: bool,
    pub is_animating: bool,
    pub is_paused: bool,
    pub player_initial_positions: Option<BTreeMap<PlayerId, PitchPos>>,
    pub animation_trails: Vec<Trail>,
    pub playbook_categories: BTreeMap<PlayCategory, bool>,
    pub roster_search_query: String,
    pub roster_role_filters: BTreeSet<RoleCategory>,
    pub ai: AiState,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            save_slots: BTreeMap::new(),
            active_save_slot_id: None,
            team_kits: Sided::new(TeamKit::home(), TeamKit::away()),
            active_team_context: TeamView::Both,
            selected_player_id: None,
            tutorial: Tutorial::default(),
            drawing_tool: DrawingTool::Select,
            drawing_color: "#FFFF00".into(),
            positioning_mode: PositioningMode::Snap,
            active_playbook_item_id: None,
            active_step_index: None,

            active_modal: None,
            editing_player_id: None,
            player_to_compare_id: None,
            slot_action_menu: None,
            pending_loan_request: None,
            notifications: Vec::new(),
            is_grid_visible: false,
            is_formation_strength_visible: false,
            is_presentation_mode: false,
            is_exporting_lineup: false,
            is_animating: false,
            is_paused: false,
            player_initial_positions: None,
            animation_trails: Vec::new(),
            playbook_categories: BTreeMap::from([(PlayCategory::General, true)]),
            roster_search_query: String::new(),
            roster_role_filters: BTreeSet::new(),
            ai: AiState::default(),
        }
    }
}

impl UiState {
    /// Whether `category` is expanded in the playbook panel.
    pub fn category_visible(&self, category: PlayCategory) -> bool {
        self.playbook_categories.get(&category).copied().unwrap_or(false)
    }

    /// Animation running and not paused.
    pub fn is_playing(&self) -> bool {
        self.is_animating && !self.is_paused
    }
}
