//! Roster players and role catalogue

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::formation::RoleCategory;
use crate::geometry::{PitchPos, Team};

pub type PlayerId = String;

/// A named tactical role (`cb`, `dlp`, `tf`, ...) and the slot category it fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
    pub category: RoleCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAttributes {
    pub speed: u8,
    pub passing: u8,
    pub tackling: u8,
    pub shooting: u8,
    pub dribbling: u8,
    pub positioning: u8,
    pub stamina: u8,
}

impl Default for PlayerAttributes {
    fn default() -> Self {
        Self {
            speed: 60,
            passing: 60,
            tackling: 60,
            shooting: 60,
            dribbling: 60,
            positioning: 60,
            stamina: 60,
        }
    }
}

impl PlayerAttributes {
    pub fn overall(&self) -> u8 {
        let sum = self.speed as u32
            + self.passing as u32
            + self.tackling as u32
            + self.shooting as u32
            + self.dribbling as u32
            + self.positioning as u32
            + self.stamina as u32;
        (sum / 7) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum Availability {
    #[default]
    Available,
    #[serde(rename = "Minor Injury")]
    MinorInjury,
    #[serde(rename = "Major Injury")]
    MajorInjury,
    Suspended,
    #[serde(rename = "International Duty")]
    InternationalDuty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum Morale {
    Excellent,
    #[default]
    Good,
    Okay,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum Form {
    Excellent,
    Good,
    #[default]
    Average,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanStatus {
    pub is_loaned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loaned_to: Option<String>,
}

fn full_stamina() -> u8 {
    100
}

fn default_age() -> u8 {
    24
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub jersey_number: u8,
    #[serde(default = "default_age")]
    pub age: u8,
    #[serde(default)]
    pub nationality: String,
    pub role_id: String,
    pub team: Team,
    pub position: PitchPos,
    #[serde(default)]
    pub attributes: PlayerAttributes,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub morale: Morale,
    #[serde(default)]
    pub form: Form,
    #[serde(default = "full_stamina")]
    pub stamina: u8,
    #[serde(default)]
    pub fatigue: u8,
    #[serde(default)]
    pub loan: LoanStatus,
    #[serde(default)]
    pub instructions: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Player {
    /// Fit, not injured or suspended, and not out on loan.
    pub fn is_selectable(&self) -> bool {
        !self.loan.is_loaned
            && matches!(self.availability, Availability::Available | Availability::MinorInjury)
    }
}
