//! Formations and their slots

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use crate::geometry::PitchPos;

pub type SlotId = String;

/// Broad positional category a slot expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum RoleCategory {
    GK,
    DF,
    MF,
    FW,
}

/// Anchor point of a formation; holds at most one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: SlotId,
    pub role: RoleCategory,
    pub default_position: PitchPos,
    #[serde(default)]
    pub player_id: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Formation {
    pub id: String,
    pub name: String,
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Formation {
    pub fn slot(&self, slot_id: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == slot_id)
    }

    pub fn slot_mut(&mut self, slot_id: &str) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.id == slot_id)
    }

    /// Slot currently holding `player_id`.
    pub fn slot_of(&self, player_id: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.player_id.as_deref() == Some(player_id))
    }

    pub fn bound_players(&self) -> impl Iterator<Item = &PlayerId> {
        self.slots.iter().filter_map(|s| s.player_id.as_ref())
    }

    pub fn has_bindings(&self) -> bool {
        self.slots.iter().any(|s| s.player_id.is_some())
    }

    /// Clear every slot holding `player_id`. Returns whether anything changed.
    pub fn unbind(&mut self, player_id: &str) -> bool {
        let mut changed = false;
        for slot in &mut self.slots {
            if slot.player_id.as_deref() == Some(player_id) {
                slot.player_id = None;
                changed = true;
            }
        }
        changed
    }

    pub fn unbind_all(&mut self) {
        for slot in &mut self.slots {
            slot.player_id = None;
        }
    }
}
