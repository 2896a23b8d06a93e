//! Chemistry Evaluator
//!
//! Pure and deterministic; safe to call on every render. Scores are
//! symmetric: `score(a, b) == score(b, a)` for every pair.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::geometry::{PitchPos, Team};
use crate::models::{Formation, FranchiseState, MentoringGroup, Player, PlayerId, Relationship};

/// Sparse `a -> b -> score` cache. Either direction may hold the value.
pub type ChemistryTable = BTreeMap<PlayerId, BTreeMap<PlayerId, u8>>;

pub const NEUTRAL_CHEMISTRY: u8 = 50;
pub const MAX_CHEMISTRY: u8 = 100;

const FRIENDSHIP_BONUS: i32 = 15;
const RIVALRY_PENALTY: i32 = -25;
const MENTORING_BONUS: i32 = 10;

/// Lower bound of the strong tier.
pub const STRONG_THRESHOLD: u8 = 75;
/// Lower bound of the weak tier; anything below is not drawn.
pub const WEAK_THRESHOLD: u8 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkTier {
    Strong,
    Weak,
}

impl LinkTier {
    pub fn from_score(score: u8) -> Option<LinkTier> {
        if score >= STRONG_THRESHOLD {
            Some(LinkTier::Strong)
        } else if score >= WEAK_THRESHOLD {
            Some(LinkTier::Weak)
        } else {
            None
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            LinkTier::Strong => "#2dd4bf",
            LinkTier::Weak => "#facc15",
        }
    }

    pub fn opacity(self) -> f64 {
        match self {
            LinkTier::Strong => 0.7,
            LinkTier::Weak => 0.5,
        }
    }
}

/// Sorted id pair; the single key an unordered pair is known by.
pub fn pair_key<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Stored score for an unordered pair. The sorted direction wins if both exist.
pub fn table_score(table: &ChemistryTable, a: &str, b: &str) -> Option<u8> {
    let (lo, hi) = pair_key(a, b);
    table
        .get(lo)
        .and_then(|m| m.get(hi))
        .or_else(|| table.get(hi).and_then(|m| m.get(lo)))
        .copied()
}

/// Add `delta` to a pair, capped at [`MAX_CHEMISTRY`]. Stored under the sorted key.
pub fn bump(table: &mut ChemistryTable, a: &str, b: &str, delta: u8) -> bool {
    let current = table_score(table, a, b).unwrap_or(NEUTRAL_CHEMISTRY);
    let next = current.saturating_add(delta).min(MAX_CHEMISTRY);
    if next == current && table_score(table, a, b).is_some() {
        return false;
    }
    let (lo, hi) = pair_key(a, b);
    if let Some(m) = table.get_mut(hi) {
        m.remove(lo);
    }
    table.entry(lo.to_string()).or_default().insert(hi.to_string(), next);
    true
}

/// Everything a score depends on besides the two players.
#[derive(Debug, Clone, Copy)]
pub struct ChemistryInputs<'a> {
    pub table: &'a ChemistryTable,
    pub franchise: &'a FranchiseState,
    pub mentoring: &'a [MentoringGroup],
}

impl<'a> ChemistryInputs<'a> {
    pub fn for_team(table: &'a ChemistryTable, franchise: &'a FranchiseState, team: Team) -> Self {
        Self { table, franchise, mentoring: franchise.mentoring_groups.get(team) }
    }
}

pub fn score(a: &Player, b: &Player, inputs: &ChemistryInputs<'_>) -> u8 {
    let mut value = table_score(inputs.table, &a.id, &b.id).unwrap_or(NEUTRAL_CHEMISTRY) as i32;

    match inputs.franchise.relationship(&a.id, &b.id) {
        Some(Relationship::Friendship) => value += FRIENDSHIP_BONUS,
        Some(Relationship::Rivalry) => value += RIVALRY_PENALTY,
        None => {}
    }

    if inputs.mentoring.iter().any(|g| g.contains(&a.id) && g.contains(&b.id)) {
        value += MENTORING_BONUS;
    }

    value.clamp(0, MAX_CHEMISTRY as i32) as u8
}

/// A drawable link between two adjacent occupied slots, in view space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChemistryLink {
    pub slot_ids: (String, String),
    pub player_ids: (PlayerId, PlayerId),
    pub from: PitchPos,
    pub to: PitchPos,
    pub score: u8,
    pub tier: LinkTier,
}

/// One render pass of chemistry links for `team`'s formation.
///
/// Candidate pairs are occupied slots whose anchors are closer than
/// `adjacency`; each unordered slot pair is scored once. Endpoints are the
/// two players' live positions, mirrored for the away side.
pub fn chemistry_links(
    formation: &Formation,
    team: Team,
    players: &[Player],
    inputs: &ChemistryInputs<'_>,
    adjacency: f64,
) -> Vec<ChemistryLink> {
    let occupied: Vec<(&crate::models::Slot, &Player)> = formation
        .slots
        .iter()
        .filter_map(|slot| {
            let id = slot.player_id.as_deref()?;
            players.iter().find(|p| p.id == id).map(|p| (slot, p))
        })
        .collect();

    let mut seen = BTreeSet::new();
    let mut links = Vec::new();

    for (i, (slot_a, player_a)) in occupied.iter().enumerate() {
        for (slot_b, player_b) in occupied.iter().skip(i + 1) {
            let key = pair_key(&slot_a.id, &slot_b.id);
            if key.0 == key.1 || !seen.insert(key) {
                continue;
            }
            if slot_a.default_position.distance(&slot_b.default_position) >= adjacency {
                continue;
            }

            let value = score(player_a, player_b, inputs);
            let Some(tier) = LinkTier::from_score(value) else {
                continue;
            };

            links.push(ChemistryLink {
                slot_ids: (key.0.to_string(), key.1.to_string()),
                player_ids: (player_a.id.clone(), player_b.id.clone()),
                from: player_a.position.for_team(team),
                to: player_b.position.for_team(team),
                score: value,
                tier,
            });
        }
    }

    links
}

/// Average link score across a side's adjacent pairs, `None` with no pairs.
pub fn team_chemistry(
    formation: &Formation,
    players: &[Player],
    inputs: &ChemistryInputs<'_>,
    adjacency: f64,
) -> Option<u8> {
    let bound: Vec<(&PitchPos, &Player)> = formation
        .slots
        .iter()
        .filter_map(|slot| {
            let id = slot.player_id.as_deref()?;
            players.iter().find(|p| p.id == id).map(|p| (&slot.default_position, p))
        })
        .collect();

    let mut total = 0u32;
    let mut pairs = 0u32;
    for (i, (pos_a, a)) in bound.iter().enumerate() {
        for (pos_b, b) in bound.iter().skip(i + 1) {
            if pos_a.distance(pos_b) < adjacency {
                total += score(a, b, inputs) as u32;
                pairs += 1;
            }
        }
    }
    (pairs > 0).then(|| (total / pairs) as u8)
}
