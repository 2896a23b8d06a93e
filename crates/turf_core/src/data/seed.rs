//! Default Roster / Formation / Playbook Library
//!
//! YAML 시드 데이터를 로드하고 캐싱합니다.
//!
//! ```rust
//! use turf_core::data::seed;
//!
//! let data = seed();
//! assert!(data.formation("4-4-2").is_some());
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use serde::Deserialize;

use crate::tactics::chemistry::ChemistryTable;
use crate::error::CoreError;
use crate::models::{
    Formation, FormationId, MentoringGroup, PlaybookItem, Player, PlayerId, RelationshipTable,
    Role, RoleCategory, Sided,
};

// =============================================================================
// Embedded YAML Data
// =============================================================================

/// 기본 시드 (컴파일 타임 임베딩)
pub const SEED_YAML: &str = include_str!("../../data/seed.yaml");

// =============================================================================
// Static Caching
// =============================================================================

static SEED: OnceLock<SeedData> = OnceLock::new();

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    pub roles: Vec<Role>,
    pub formations: Vec<Formation>,
    pub players: Vec<Player>,
    pub active_formation_ids: Sided<FormationId>,
    pub captain_ids: Sided<Option<PlayerId>>,
    pub tactical_familiarity: BTreeMap<FormationId, u8>,
    #[serde(default)]
    pub chemistry: ChemistryTable,
    #[serde(default)]
    pub relationships: RelationshipTable,
    #[serde(default)]
    pub mentoring_groups: Sided<Vec<MentoringGroup>>,
    #[serde(default)]
    pub library: Vec<PlaybookItem>,
}

// =============================================================================
// Public API
// =============================================================================

/// 시드 데이터 로드
///
/// # Panics
///
/// YAML 파싱에 실패하면 패닉합니다 (컴파일 타임에 임베딩된 데이터이므로
/// 정상적인 빌드에서는 발생하지 않음).
pub fn seed() -> &'static SeedData {
    SEED.get_or_init(|| serde_yaml::from_str(SEED_YAML).expect("Failed to parse seed.yaml"))
}

/// Slot category for a role id (`"cb"` → `DF`).
pub fn role_category(role_id: &str) -> Option<RoleCategory> {
    role_category_in(&seed().roles, role_id)
}

pub fn library_play(id: &str) -> Option<&'static PlaybookItem> {
    seed().library.iter().find(|item| item.id == id)
}

impl SeedData {
    pub fn formation(&self, id: &str) -> Option<&Formation> {
        self.formations.iter().find(|f| f.id == id)
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Cross-reference check: roles, slot bindings, active formations, captains.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut player_ids = BTreeSet::new();
        for player in &self.players {
            if !player_ids.insert(player.id.as_str()) {
                return Err(CoreError::InvalidParameter(format!("duplicate player id {}", player.id)));
            }
            if role_category_in(&self.roles, &player.role_id).is_none() {
                return Err(CoreError::NotFound(format!("role {} of player {}", player.role_id, player.id)));
            }
        }

        let mut bound = BTreeSet::new();
        for formation in &self.formations {
            for player_id in formation.bound_players() {
                if !player_ids.contains(player_id.as_str()) {
                    return Err(CoreError::NotFound(format!(
                        "player {} bound in formation {}",
                        player_id, formation.id
                    )));
                }
                if !bound.insert(player_id.as_str()) {
                    return Err(CoreError::InvalidParameter(format!(
                        "player {} bound to more than one slot",
                        player_id
                    )));
                }
            }
        }

        for (team, formation_id) in self.active_formation_ids.iter() {
            if self.formation(formation_id).is_none() {
                return Err(CoreError::NotFound(format!("active {:?} formation {}", team, formation_id)));
            }
        }

        for (_, captain) in self.captain_ids.iter() {
            if let Some(id) = captain {
                if !player_ids.contains(id.as_str()) {
                    return Err(CoreError::NotFound(format!("captain {}", id)));
                }
            }
        }

        Ok(())
    }
}

fn role_category_in(roles: &[Role], role_id: &str) -> Option<RoleCategory> {
    roles.iter().find(|r| r.id == role_id).map(|r| r.category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Team;

    #[test]
    fn test_seed_parses_and_validates() {
        let data = seed();
        assert_eq!(data.formations.len(), 3);
        assert_eq!(data.library.len(), 3);
        data.validate().unwrap();
    }

    #[test]
    fn test_role_categories() {
        assert_eq!(role_category("sk"), Some(RoleCategory::GK));
        assert_eq!(role_category("wb"), Some(RoleCategory::DF));
        assert_eq!(role_category("b2b"), Some(RoleCategory::MF));
        assert_eq!(role_category("tf"), Some(RoleCategory::FW));
        assert_eq!(role_category("libero"), None);
    }

    #[test]
    fn test_home_xi_bound_to_442() {
        let data = seed();
        let f442 = data.formation("4-4-2").unwrap();
        assert_eq!(f442.slot("s1").unwrap().player_id.as_deref(), Some("p1"));
        assert_eq!(f442.slot("s2").unwrap().player_id.as_deref(), Some("p2"));
        for player_id in f442.bound_players() {
            assert_eq!(data.player(player_id).unwrap().team, Team::Home);
        }
        assert!(!data.formation("3-5-2").unwrap().has_bindings());
    }

    #[test]
    fn test_validate_rejects_double_binding() {
        let mut data = seed().clone();
        data.formations[2].slots[0].player_id = Some("p1".into());
        assert!(data.validate().is_err());
    }
}
