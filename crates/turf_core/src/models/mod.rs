//! Domain data model
//!
//! 로스터, 포메이션, 드로잉, 플레이북, 프랜차이즈, UI 상태 타입

pub mod auth;
pub mod drawing;
pub mod formation;
pub mod franchise;
pub mod playbook;
pub mod player;
pub mod team;
pub mod ui;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::Team;

pub use auth::{AuthState, User, UserRole};
pub use drawing::{Drawing, DrawingTool};
pub use formation::{Formation, RoleCategory, Slot, SlotId};
pub use franchise::{
    FranchiseState, MatchResult, MentoringGroup, NegotiationData, Relationship, RelationshipTable,
};
pub use playbook::{BallPath, EventKind, PlayCategory, PlaybookEvent, PlaybookItem, PlaybookStep, PlayerRun};
pub use player::{Availability, Form, LoanStatus, Morale, Player, PlayerAttributes, PlayerId, Role};
pub use team::{Intensity, LineHeight, Mentality, SetPieceType, TacticChange, TeamTactics, Width};
pub use ui::{
    AiChannel, AiState, LoanRequest, MenuTrigger, ModalType, Notification, NotificationKind,
    PositioningMode, SaveSlot, ScreenPos, SlotActionMenu, Theme, TeamKit, Trail, Tutorial, UiState,
};

pub type FormationId = String;
pub type PlaybookItemId = String;

/// One value per side of the pitch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Sided<T> {
    pub home: T,
    pub away: T,
}

impl<T> Sided<T> {
    pub fn new(home: T, away: T) -> Self {
        Self { home, away }
    }

    pub fn get(&self, team: Team) -> &T {
        match team {
            Team::Home => &self.home,
            Team::Away => &self.away,
        }
    }

    pub fn get_mut(&mut self, team: Team) -> &mut T {
        match team {
            Team::Home => &mut self.home,
            Team::Away => &mut self.away,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Team, &T)> {
        [(Team::Home, &self.home), (Team::Away, &self.away)].into_iter()
    }
}
