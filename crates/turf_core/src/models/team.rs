//! Team-level tactical settings

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Mentality {
    VeryDefensive,
    Defensive,
    #[default]
    Balanced,
    Attacking,
    VeryAttacking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LineHeight {
    Deep,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Width {
    Narrow,
    #[default]
    Balanced,
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamTactics {
    pub mentality: Mentality,
    pub pressing: Intensity,
    pub defensive_line: LineHeight,
    pub attacking_width: Width,
}

/// A single tactic knob change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tactic", content = "value", rename_all = "camelCase")]
pub enum TacticChange {
    Mentality(Mentality),
    Pressing(Intensity),
    DefensiveLine(LineHeight),
    AttackingWidth(Width),
}

impl TeamTactics {
    /// Apply `change`; `None` when it is already in effect.
    pub fn with(&self, change: TacticChange) -> Option<TeamTactics> {
        let mut next = *self;
        match change {
            TacticChange::Mentality(v) => next.mentality = v,
            TacticChange::Pressing(v) => next.pressing = v,
            TacticChange::DefensiveLine(v) => next.defensive_line = v,
            TacticChange::AttackingWidth(v) => next.attacking_width = v,
        }
        (next != *self).then_some(next)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SetPieceType {
    LeftCorner,
    RightCorner,
    ShortFreeKick,
    LongFreeKick,
    Penalty,
}
