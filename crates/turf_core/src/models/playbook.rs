//! Playbook items and steps

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::drawing::Drawing;
use super::player::PlayerId;
use crate::geometry::PitchPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, JsonSchema)]
pub enum PlayCategory {
    #[default]
    General,
    #[serde(rename = "Attacking Corner")]
    AttackingCorner,
    #[serde(rename = "Defending Corner")]
    DefendingCorner,
    #[serde(rename = "Attacking Free Kick")]
    AttackingFreeKick,
    #[serde(rename = "Defending Free Kick")]
    DefendingFreeKick,
    #[serde(rename = "Throw-in")]
    ThrowIn,
}

impl PlayCategory {
    pub const ALL: [PlayCategory; 6] = [
        PlayCategory::General,
        PlayCategory::AttackingCorner,
        PlayCategory::DefendingCorner,
        PlayCategory::AttackingFreeKick,
        PlayCategory::DefendingFreeKick,
        PlayCategory::ThrowIn,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum EventKind {
    Goal,
    #[serde(rename = "Yellow Card")]
    YellowCard,
    #[serde(rename = "Red Card")]
    RedCard,
}

/// Match event marker attached to a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlaybookEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRun {
    pub player_id: PlayerId,
    pub points: Vec<PitchPos>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BallPath {
    pub points: Vec<PitchPos>,
}

/// Full positional and annotation snapshot for one frame of a play.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaybookStep {
    pub id: String,
    pub player_positions: BTreeMap<PlayerId, PitchPos>,
    #[serde(default)]
    pub drawings: Vec<Drawing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<PlaybookEvent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub player_runs: Vec<PlayerRun>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ball_path: Option<BallPath>,
}

impl PlaybookStep {
    pub fn run_for(&self, player_id: &str) -> Option<&PlayerRun> {
        self.player_runs.iter().find(|r| r.player_id == player_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaybookItem {
    pub id: String,
    pub name: String,
    pub category: PlayCategory,
    pub formation_id: String,
    pub steps: Vec<PlaybookStep>,
}
