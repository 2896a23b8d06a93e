//! Franchise state consumed by the tactics core
//!
//! Only the slice the core reads or writes: week counter, transfer budgets,
//! mentoring groups, player relationships and the two transient workflow
//! fields that are dropped from snapshots.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use super::Sided;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Friendship,
    Rivalry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MentoringGroup {
    pub mentor_id: PlayerId,
    pub mentee_ids: Vec<PlayerId>,
}

impl MentoringGroup {
    pub fn contains(&self, player_id: &str) -> bool {
        self.mentor_id == player_id || self.mentee_ids.iter().any(|id| id == player_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub opponent: String,
    pub home_score: u8,
    pub away_score: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationData {
    pub player_id: PlayerId,
    pub conversation: Vec<String>,
}

pub type RelationshipTable = BTreeMap<PlayerId, BTreeMap<PlayerId, Relationship>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FranchiseState {
    pub game_week: u32,
    pub transfer_budgets: Sided<i64>,
    pub mentoring_groups: Sided<Vec<MentoringGroup>>,
    pub relationships: RelationshipTable,
    /// Transient
    #[serde(default)]
    pub last_match_result: Option<MatchResult>,
    /// Transient
    #[serde(default)]
    pub negotiation_data: Option<NegotiationData>,
}

impl Default for FranchiseState {
    fn default() -> Self {
        Self {
            game_week: 1,
            transfer_budgets: Sided::new(50_000_000, 50_000_000),
            mentoring_groups: Sided::default(),
            relationships: BTreeMap::new(),
            last_match_result: None,
            negotiation_data: None,
        }
    }
}

impl FranchiseState {
    /// Relationship between two players, looked up in both directions.
    /// Rivalry wins when the two directions disagree.
    pub fn relationship(&self, a: &str, b: &str) -> Option<Relationship> {
        let forward = self.relationships.get(a).and_then(|m| m.get(b)).copied();
        let backward = self.relationships.get(b).and_then(|m| m.get(a)).copied();
        match (forward, backward) {
            (Some(Relationship::Rivalry), _) | (_, Some(Relationship::Rivalry)) => Some(Relationship::Rivalry),
            (Some(r), _) | (_, Some(r)) => Some(r),
            (None, None) => None,
        }
    }
}
