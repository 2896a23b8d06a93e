//! Root state tree
//!
//! `RootState` is an immutable tree of `Arc`-shared subtrees. Transitions go
//! through [`reduce`]; untouched subtrees stay pointer-identical, so consumers
//! can detect change with [`Arc::ptr_eq`].

pub mod action;
pub mod reducer;
pub mod session;

use std::collections::BTreeMap;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::data::seed;
use crate::geometry::{PitchPos, Team};
use crate::models::{
    AuthState, Drawing, Formation, FormationId, FranchiseState, PlaybookItem, PlaybookItemId,
    Player, PlayerId, SetPieceType, Sided, TeamTactics, UiState,
};
use crate::tactics::chemistry::ChemistryTable;

pub use action::Action;
pub use reducer::reduce;
pub use session::Session;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TacticsState {
    pub players: Arc<Vec<Player>>,
    pub formations: Arc<BTreeMap<FormationId, Formation>>,
    pub playbook: Arc<BTreeMap<PlaybookItemId, PlaybookItem>>,
    pub active_formation_ids: Sided<FormationId>,
    pub team_tactics: Sided<TeamTactics>,
    pub drawings: Arc<Vec<Drawing>>,
    pub tactical_familiarity: BTreeMap<FormationId, u8>,
    pub chemistry: Arc<ChemistryTable>,
    pub captain_ids: Sided<Option<PlayerId>>,
    pub set_piece_takers: Sided<BTreeMap<SetPieceType, PlayerId>>,
}

impl TacticsState {
    pub fn initial() -> Self {
        let seed = seed();
        let mut team_tactics = Sided::<TeamTactics>::default();
        team_tactics.away.pressing = crate::models::Intensity::Low;

        Self {
            players: Arc::new(seed.players.clone()),
            formations: Arc::new(seed.formations.iter().map(|f| (f.id.clone(), f.clone())).collect()),
            playbook: Arc::new(BTreeMap::new()),
            active_formation_ids: seed.active_formation_ids.clone(),
            team_tactics,
            drawings: Arc::new(Vec::new()),
            tactical_familiarity: seed.tactical_familiarity.clone(),
            chemistry: Arc::new(seed.chemistry.clone()),
            captain_ids: seed.captain_ids.clone(),
            set_piece_takers: Sided::default(),
        }
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_index(&self, id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn active_formation(&self, team: Team) -> Option<&Formation> {
        self.formations.get(self.active_formation_ids.get(team))
    }

    /// Side whose active formation is `formation_id`.
    pub fn side_of_formation(&self, formation_id: &str) -> Option<Team> {
        self.active_formation_ids
            .iter()
            .find(|(_, id)| id.as_str() == formation_id)
            .map(|(team, _)| team)
    }

    /// `(formation id, slot id)` currently holding `player_id`.
    pub fn binding_of(&self, player_id: &str) -> Option<(&FormationId, &str)> {
        self.formations
            .iter()
            .find_map(|(fid, f)| f.slot_of(player_id).map(|s| (fid, s.id.as_str())))
    }

    pub fn live_positions(&self) -> BTreeMap<PlayerId, PitchPos> {
        self.players.iter().map(|p| (p.id.clone(), p.position)).collect()
    }

    /// Players bound in `team`'s active formation, in slot order.
    pub fn starters(&self, team: Team) -> Vec<&Player> {
        self.active_formation(team)
            .map(|f| f.bound_players().filter_map(|id| self.player(id)).collect())
            .unwrap_or_default()
    }
}

/// The whole application state. Authentication never reaches storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootState {
    pub auth: Arc<AuthState>,
    pub tactics: Arc<TacticsState>,
    pub franchise: Arc<FranchiseState>,
    pub ui: Arc<UiState>,
}

impl RootState {
    pub fn initial() -> Self {
        let seed = seed();
        let franchise = FranchiseState {
            relationships: seed.relationships.clone(),
            mentoring_groups: seed.mentoring_groups.clone(),
            ..FranchiseState::default()
        };

        Self {
            auth: Arc::new(AuthState::default()),
            tactics: Arc::new(TacticsState::initial()),
            franchise: Arc::new(franchise),
            ui: Arc::new(UiState::default()),
        }
    }

    /// Every subtree pointer-identical to `other`.
    pub fn same_as(&self, other: &RootState) -> bool {
        Arc::ptr_eq(&self.auth, &other.auth)
            && Arc::ptr_eq(&self.tactics, &other.tactics)
            && Arc::ptr_eq(&self.franchise, &other.franchise)
            && Arc::ptr_eq(&self.ui, &other.ui)
    }

    /// The persisted subtrees (tactics, franchise, ui) are pointer-identical to `other`.
    pub fn persisted_same_as(&self, other: &RootState) -> bool {
        Arc::ptr_eq(&self.tactics, &other.tactics)
            && Arc::ptr_eq(&self.franchise, &other.franchise)
            && Arc::ptr_eq(&self.ui, &other.ui)
    }
}

impl Default for RootState {
    fn default() -> Self {
        Self::initial()
    }
}
