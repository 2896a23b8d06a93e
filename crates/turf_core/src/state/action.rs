//! Actions
//!
//! Every state change is one of these. Ids are minted by the constructors at
//! the bottom of this file so that [`super::reduce`] stays pure.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::APP_VERSION;
use crate::geometry::{PitchPos, Team, TeamView};
use crate::models::{
    AiChannel, Drawing, DrawingTool, Formation, MatchResult, MentoringGroup, ModalType,
    Notification, NotificationKind, PlayCategory, PlaybookEvent, PlaybookItem, Player, PlayerId,
    PositioningMode, Relationship, RoleCategory, SaveSlot, SetPieceType, SlotActionMenu,
    TacticChange, TeamKit, Tutorial, User,
};
use crate::save::{SaveError, Snapshot};
use crate::tactics::SlotDecision;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    // ---- auth ----
    LoginSuccess { user: User },
    LoginFailure { error: String },
    Logout,
    SignupSuccess { user: User },
    SignupFailure { error: String },

    // ---- root ----
    /// Replace tactics, franchise and ui with a loaded snapshot. Auth is kept.
    LoadState { snapshot: Box<Snapshot> },
    ResetState,

    // ---- roster / formation ----
    AddPlayer { player: Player },
    UpdatePlayer { player: Player },
    SelectPlayer { player_id: Option<PlayerId> },
    SetCaptain { player_id: PlayerId },
    BenchPlayer { player_id: PlayerId },
    BenchAllPlayers { team: Team },
    AssignPlayerTeam { player_id: PlayerId, team: Team },
    SetActiveFormation { team: Team, formation_id: String },
    ClearFormation,
    AssignPlayerToSlot { slot_id: String, player_id: PlayerId, team: Team },
    UpdatePlayerPosition { player_id: PlayerId, position: PitchPos },
    SetTeamTactic { team: Team, change: TacticChange },
    SaveCustomFormation { formation: Formation },
    DeleteCustomFormation { formation_id: String },
    UpdateTacticalFamiliarity { formation_id: String, increase: i16 },
    SetSetPieceTaker { team: Team, set_piece: SetPieceType, player_id: Option<PlayerId> },

    // ---- ui ----
    SetActiveTeamContext { view: TeamView },
    OpenModal { modal: ModalType },
    CloseModal,
    SetEditingPlayer { player_id: Option<PlayerId> },
    SetPlayerToCompare { player_id: Option<PlayerId> },
    OpenSlotActionMenu { menu: SlotActionMenu },
    CloseSlotActionMenu,
    ResolveSlotAction { decision: SlotDecision },
    SwapPlayers { source_player_id: PlayerId, target_player_id: PlayerId },
    ToggleGridVisibility,
    ToggleFormationStrengthVisibility,
    ToggleTheme,
    SetTeamKit { team: Team, kit: TeamKit },
    AddNotification { notification: Notification },
    RemoveNotification { id: String },
    EnterPresentationMode,
    ExitPresentationMode,
    SetRosterSearchQuery { query: String },
    ToggleRosterRoleFilter { role: RoleCategory },
    SetTutorial { tutorial: Tutorial },

    // ---- drawing ----
    SetDrawingTool { tool: DrawingTool },
    SetDrawingColor { color: String },
    SetPositioningMode { mode: PositioningMode },
    AddDrawing { drawing: Drawing },
    UndoLastDrawing,
    ClearDrawings,

    // ---- playbook ----
    CreatePlaybookItem { id: String, step_id: String, name: String, category: PlayCategory },
    LoadPlaybookItem { item_id: String },
    DeletePlaybookItem { item_id: String },
    DuplicatePlaybookItem { item_id: String, new_id: String },
    AddLibraryPlayToPlaybook { library_id: String, new_id: String },
    LoadPlaybook { items: Vec<PlaybookItem> },
    ClosePlaybook,
    TogglePlaybookCategory { category: PlayCategory },
    SetActiveStep { index: usize },
    AddPlaybookStep { step_id: String },
    DeletePlaybookStep { index: usize },
    SetPlaybookEvent { step_index: usize, event: Option<PlaybookEvent> },
    SetPlayerRun { step_index: usize, player_id: PlayerId, points: Vec<PitchPos> },
    SetBallPath { step_index: usize, points: Vec<PitchPos> },
    StartAnimation,
    PauseAnimation,
    ResumeAnimation,
    ResetAnimation,
    /// Scheduled by the session; stale ticks are ignored by the reducer.
    AnimationTick { item_id: String, from_step: usize },

    // ---- save slots ----
    CreateSaveSlot { slot: SaveSlot },
    DeleteSaveSlot { slot_id: String },
    SetActiveSaveSlot { slot_id: Option<String> },

    // ---- ai ----
    AiRequestStarted { channel: AiChannel },
    AiRequestSucceeded { channel: AiChannel, result: serde_json::Value },
    AiRequestFailed { channel: AiChannel, error: String },

    // ---- franchise ----
    AdvanceWeek,
    CreateMentoringGroup { team: Team, group: MentoringGroup },
    DissolveMentoringGroup { team: Team, mentor_id: PlayerId },
    SetRelationship { player_a: PlayerId, player_b: PlayerId, relationship: Option<Relationship> },
    SellPlayer { player_id: PlayerId, fee: i64 },
    SignPlayer { player: Player, fee: i64 },
    LoanPlayer { player_id: PlayerId, club: String },
    RecallPlayer { player_id: PlayerId },
    RecoverStamina { team: Team, amount: u8 },
    ClearLoanRequest,
    RecordMatchResult { result: MatchResult },
    StartNegotiation { player_id: PlayerId },
    EndNegotiation,

    // ---- export ----
    ExportLineupStart,
    ExportLineupFinish,
}

fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

impl Action {
    pub fn create_playbook_item(name: impl Into<String>, category: PlayCategory) -> Self {
        Action::CreatePlaybookItem {
            id: new_id("play"),
            step_id: new_id("step"),
            name: name.into(),
            category,
        }
    }

    pub fn add_playbook_step() -> Self {
        Action::AddPlaybookStep { step_id: new_id("step") }
    }

    pub fn duplicate_playbook_item(item_id: impl Into<String>) -> Self {
        Action::DuplicatePlaybookItem { item_id: item_id.into(), new_id: new_id("play") }
    }

    pub fn add_library_play(library_id: impl Into<String>) -> Self {
        Action::AddLibraryPlayToPlaybook { library_id: library_id.into(), new_id: new_id("play") }
    }

    pub fn notify(message: impl Into<String>, kind: NotificationKind) -> Self {
        Action::AddNotification {
            notification: Notification { id: new_id("note"), message: message.into(), kind },
        }
    }

    /// New save slot stamped with the current UTC time.
    pub fn create_save_slot(name: impl Into<String>) -> Result<Self, SaveError> {
        let last_saved = OffsetDateTime::now_utc().format(&Rfc3339)?;
        Ok(Action::CreateSaveSlot {
            slot: SaveSlot {
                id: new_id("slot"),
                name: name.into(),
                last_saved,
                app_version: APP_VERSION.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let action = Action::SetActiveFormation { team: Team::Away, formation_id: "4-3-3".into() };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "SET_ACTIVE_FORMATION", "payload": {"team": "away", "formation_id": "4-3-3"}})
        );

        let unit: Action = serde_json::from_str(r#"{"type":"CLEAR_FORMATION"}"#).unwrap();
        assert_eq!(unit, Action::ClearFormation);
    }

    #[test]
    fn test_constructors_mint_unique_ids() {
        let a = Action::create_playbook_item("Press", PlayCategory::General);
        let b = Action::create_playbook_item("Press", PlayCategory::General);
        assert_ne!(a, b);

        let Action::CreateSaveSlot { slot } = Action::create_save_slot("Derby").unwrap() else {
            panic!("expected CreateSaveSlot");
        };
        assert_eq!(slot.app_version, APP_VERSION);
        assert!(slot.id.starts_with("slot_"));
    }
}
