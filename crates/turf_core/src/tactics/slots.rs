//! Formation/Slot Model
//!
//! 슬롯 배정 정책 (snap / free) 과 포메이션 전환.
//!
//! Every operation takes the current [`TacticsState`] and returns the next
//! one, or `None` when the request is invalid or would change nothing. The
//! caller keeps the old state in that case, so no-ops stay pointer-identical.
//!
//! Exclusivity holds after every operation: a player id appears in at most
//! one slot across all formations.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;

use crate::data::role_category;
use crate::geometry::{PitchPos, Team};
use crate::models::{
    Formation, FormationId, Player, PositioningMode, RoleCategory, SetPieceType, Slot, TacticChange,
};
use crate::state::TacticsState;

/// Placing a keeper in an outfield slot (or the reverse).
const COST_INCOMPATIBLE: i64 = 1_000_000;
/// Outfield player in a slot of another category.
const COST_ROLE_MISMATCH: i64 = 1_000;
/// Cost units per percentage point of travel.
const COST_PER_UNIT_DISTANCE: f64 = 10.0;

// =============================================================================
// Helpers
// =============================================================================

fn unbind_everywhere(formations: &mut BTreeMap<FormationId, Formation>, player_id: &str) -> bool {
    let mut changed = false;
    for formation in formations.values_mut() {
        changed |= formation.unbind(player_id);
    }
    changed
}

fn player_mut<'a>(players: &'a mut [Player], player_id: &str) -> Option<&'a mut Player> {
    players.iter_mut().find(|p| p.id == player_id)
}

/// Drop captaincy and set-piece duties `player_id` holds for `side`.
fn release_side_refs(t: &mut TacticsState, player_id: &str, side: Team) {
    let captain = t.captain_ids.get_mut(side);
    if captain.as_deref() == Some(player_id) {
        *captain = None;
    }
    t.set_piece_takers.get_mut(side).retain(|_, id| id != player_id);
}

/// Move a player to `side`, releasing duties held for the other one.
fn set_team(t: &mut TacticsState, player_id: &str, side: Team) {
    let previous = match t.player(player_id) {
        Some(p) if p.team != side => p.team,
        _ => return,
    };
    if let Some(p) = player_mut(Arc::<Vec<Player>>::make_mut(&mut t.players), player_id) {
        p.team = side;
    }
    release_side_refs(t, player_id, previous);
}

fn set_position(t: &mut TacticsState, player_id: &str, position: PitchPos) {
    if t.player(player_id).map(|p| p.position) == Some(position) {
        return;
    }
    if let Some(p) = player_mut(Arc::<Vec<Player>>::make_mut(&mut t.players), player_id) {
        p.position = position;
    }
}

fn anchor_of(t: &TacticsState, formation_id: &str, slot_id: &str) -> Option<PitchPos> {
    t.formations.get(formation_id)?.slot(slot_id).map(|s| s.default_position)
}

// =============================================================================
// Assignment policies
// =============================================================================

/// Drop `player_id` onto `slot_id` of `team`'s active formation.
///
/// - `Snap`: binds the slot (no-op if it holds a different player), releases
///   any other slot the player held, moves them to the anchor and onto `team`.
/// - `Free`: only relocates the player to the slot anchor; bindings untouched.
pub fn assign_player_to_slot(
    t: &TacticsState,
    mode: PositioningMode,
    slot_id: &str,
    player_id: &str,
    team: Team,
) -> Option<TacticsState> {
    let formation_id = t.active_formation_ids.get(team).clone();
    let slot = t.formations.get(&formation_id)?.slot(slot_id)?;
    let player = t.player(player_id)?;
    let anchor = slot.default_position;

    match mode {
        PositioningMode::Free => {
            if player.position == anchor {
                return None;
            }
            let mut next = t.clone();
            set_position(&mut next, player_id, anchor);
            Some(next)
        }
        PositioningMode::Snap => {
            match slot.player_id.as_deref() {
                Some(current) if current != player_id => {
                    log::debug!("slot {}/{} already holds {}", formation_id, slot_id, current);
                    return None;
                }
                Some(_) if player.position == anchor && player.team == team => return None,
                _ => {}
            }
            if player.loan.is_loaned {
                log::debug!("player {} is out on loan", player_id);
                return None;
            }

            let mut next = t.clone();
            let formations = Arc::make_mut(&mut next.formations);
            unbind_everywhere(formations, player_id);
            formations.get_mut(&formation_id)?.slot_mut(slot_id)?.player_id = Some(player_id.to_string());
            set_position(&mut next, player_id, anchor);
            set_team(&mut next, player_id, team);
            Some(next)
        }
    }
}

/// Free placement on the open pitch. Rejected in snap mode.
pub fn update_player_position(
    t: &TacticsState,
    mode: PositioningMode,
    player_id: &str,
    position: PitchPos,
) -> Option<TacticsState> {
    if mode == PositioningMode::Snap {
        log::debug!("free placement of {} rejected in snap mode", player_id);
        return None;
    }
    if t.player(player_id)?.position == position {
        return None;
    }
    let mut next = t.clone();
    set_position(&mut next, player_id, position);
    Some(next)
}

pub fn bench_player(t: &TacticsState, player_id: &str) -> Option<TacticsState> {
    t.binding_of(player_id)?;
    let mut next = t.clone();
    unbind_everywhere(Arc::make_mut(&mut next.formations), player_id);
    Some(next)
}

pub fn bench_all(t: &TacticsState, team: Team) -> Option<TacticsState> {
    let formation_id = t.active_formation_ids.get(team).clone();
    if !t.formations.get(&formation_id)?.has_bindings() {
        return None;
    }
    let mut next = t.clone();
    Arc::make_mut(&mut next.formations).get_mut(&formation_id)?.unbind_all();
    Some(next)
}

/// Empty both active formations.
pub fn clear_formation(t: &TacticsState) -> Option<TacticsState> {
    let ids: Vec<FormationId> = t.active_formation_ids.iter().map(|(_, id)| id.clone()).collect();
    if !ids.iter().any(|id| t.formations.get(id).is_some_and(Formation::has_bindings)) {
        return None;
    }
    let mut next = t.clone();
    let formations = Arc::make_mut(&mut next.formations);
    for id in &ids {
        if let Some(f) = formations.get_mut(id) {
            f.unbind_all();
        }
    }
    Some(next)
}

// =============================================================================
// Swap / replace
// =============================================================================

/// Exchange the slot bindings of two players.
///
/// A benched source takes the target's slot and the target is benched. In
/// snap mode moved players jump to their new anchors; in free mode the two
/// exchange positions.
pub fn swap_players(
    t: &TacticsState,
    mode: PositioningMode,
    source_id: &str,
    target_id: &str,
) -> Option<TacticsState> {
    if source_id == target_id {
        return None;
    }
    let source = t.player(source_id)?;
    let target = t.player(target_id)?;
    if source.loan.is_loaned || target.loan.is_loaned {
        log::debug!("swap {} <-> {} involves a loaned player", source_id, target_id);
        return None;
    }
    let source_binding = t.binding_of(source_id).map(|(f, s)| (f.clone(), s.to_string()));
    let target_binding = t.binding_of(target_id).map(|(f, s)| (f.clone(), s.to_string()));
    if source_binding.is_none() && target_binding.is_none() {
        return None;
    }
    let (source_pos, target_pos) = (source.position, target.position);

    let mut next = t.clone();
    let formations = Arc::make_mut(&mut next.formations);
    unbind_everywhere(formations, source_id);
    unbind_everywhere(formations, target_id);
    if let Some((fid, sid)) = &source_binding {
        formations.get_mut(fid)?.slot_mut(sid)?.player_id = Some(target_id.to_string());
    }
    if let Some((fid, sid)) = &target_binding {
        formations.get_mut(fid)?.slot_mut(sid)?.player_id = Some(source_id.to_string());
    }

    for (moved, new_binding, other_pos) in [
        (source_id, &target_binding, target_pos),
        (target_id, &source_binding, source_pos),
    ] {
        match mode {
            PositioningMode::Snap => {
                if let Some((fid, sid)) = new_binding {
                    let anchor = anchor_of(&next, fid, sid)?;
                    set_position(&mut next, moved, anchor);
                }
            }
            PositioningMode::Free => {
                if new_binding.is_some() {
                    set_position(&mut next, moved, other_pos);
                }
            }
        }
        if let Some(side) = new_binding.as_ref().and_then(|(fid, _)| next.side_of_formation(fid)) {
            set_team(&mut next, moved, side);
        }
    }

    Some(next)
}

/// `source_id` takes `slot_id` of `formation_id`; whoever held it is benched.
pub fn replace_in_slot(
    t: &TacticsState,
    mode: PositioningMode,
    source_id: &str,
    formation_id: &str,
    slot_id: &str,
) -> Option<TacticsState> {
    let slot = t.formations.get(formation_id)?.slot(slot_id)?;
    let source = t.player(source_id)?;
    if slot.player_id.as_deref() == Some(source_id) || source.loan.is_loaned {
        return None;
    }
    let new_position = match (mode, slot.player_id.as_deref().and_then(|id| t.player(id))) {
        (PositioningMode::Free, Some(evicted)) => evicted.position,
        (PositioningMode::Free, None) => source.position,
        (PositioningMode::Snap, _) => slot.default_position,
    };

    let mut next = t.clone();
    let formations = Arc::make_mut(&mut next.formations);
    unbind_everywhere(formations, source_id);
    formations.get_mut(formation_id)?.slot_mut(slot_id)?.player_id = Some(source_id.to_string());
    set_position(&mut next, source_id, new_position);
    if let Some(side) = next.side_of_formation(formation_id) {
        set_team(&mut next, source_id, side);
    }
    Some(next)
}

// =============================================================================
// Formation switching
// =============================================================================

struct Carried {
    player_id: String,
    from: PitchPos,
    category: Option<RoleCategory>,
}

fn migration_cost(carried: &Carried, slot: &Slot) -> i64 {
    let role_cost = match carried.category {
        Some(category) if category == slot.role => 0,
        Some(category) if category == RoleCategory::GK || slot.role == RoleCategory::GK => COST_INCOMPATIBLE,
        Some(_) => COST_ROLE_MISMATCH,
        None => 0,
    };
    let travel = (carried.from.distance(&slot.default_position) * COST_PER_UNIT_DISTANCE).round() as i64;
    role_cost + travel
}

/// Minimum-cost carry-over of bound players into the slots of a new shape.
/// Returns `(carried index, slot index)` pairs. With more players than slots
/// the solver picks which players stay; the rest are left out.
fn plan_migration(carried: &[Carried], slots: &[Slot]) -> Vec<(usize, usize)> {
    if carried.is_empty() || slots.is_empty() {
        return Vec::new();
    }

    // kuhn_munkres needs rows <= columns
    if carried.len() <= slots.len() {
        let costs = Matrix::from_fn(carried.len(), slots.len(), |(row, col)| {
            migration_cost(&carried[row], &slots[col])
        });
        let (_, assignments) = kuhn_munkres_min(&costs);
        assignments.into_iter().enumerate().collect()
    } else {
        let costs = Matrix::from_fn(slots.len(), carried.len(), |(row, col)| {
            migration_cost(&carried[col], &slots[row])
        });
        let (_, assignments) = kuhn_munkres_min(&costs);
        let mut plan: Vec<(usize, usize)> =
            assignments.into_iter().enumerate().map(|(slot, player)| (player, slot)).collect();
        plan.sort_unstable();
        plan
    }
}

/// Switch `team` to `formation_id`, carrying bound players over.
///
/// No-op if the formation is unknown, already active for `team`, or active
/// for the other side. The previous formation is left empty.
pub fn set_active_formation(t: &TacticsState, team: Team, formation_id: &str) -> Option<TacticsState> {
    let current_id = t.active_formation_ids.get(team).clone();
    if current_id == formation_id || t.active_formation_ids.get(team.opponent()) == formation_id {
        return None;
    }
    let target = t.formations.get(formation_id)?;

    let carried: Vec<Carried> = t
        .formations
        .get(&current_id)
        .map(|f| {
            f.slots
                .iter()
                .filter_map(|slot| {
                    let player = t.player(slot.player_id.as_deref()?)?;
                    Some(Carried {
                        player_id: player.id.clone(),
                        from: slot.default_position,
                        category: role_category(&player.role_id),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let mut reshaped = target.clone();
    reshaped.unbind_all();
    let plan = plan_migration(&carried, &reshaped.slots);
    for &(row, col) in &plan {
        reshaped.slots[col].player_id = Some(carried[row].player_id.clone());
    }
    if plan.len() < carried.len() {
        log::info!(
            "{} player(s) benched moving {:?} to {}",
            carried.len() - plan.len(),
            team,
            formation_id
        );
    }

    let mut next = t.clone();
    {
        let formations = Arc::make_mut(&mut next.formations);
        if let Some(old) = formations.get_mut(&current_id) {
            old.unbind_all();
        }
        for c in &carried {
            unbind_everywhere(formations, &c.player_id);
        }
        formations.insert(formation_id.to_string(), reshaped.clone());
    }
    for slot in &reshaped.slots {
        if let Some(player_id) = &slot.player_id {
            set_position(&mut next, player_id, slot.default_position);
        }
    }
    *next.active_formation_ids.get_mut(team) = formation_id.to_string();

    log::debug!("{:?} formation {} -> {}", team, current_id, formation_id);
    Some(next)
}

// =============================================================================
// Custom formations
// =============================================================================

/// Insert or overwrite a custom formation. Built-in formations cannot be
/// overwritten. Bindings that would break exclusivity are dropped.
pub fn save_custom_formation(t: &TacticsState, formation: &Formation) -> Option<TacticsState> {
    if formation.slots.is_empty() {
        return None;
    }
    if t.formations.get(&formation.id).is_some_and(|f| !f.is_custom) {
        log::warn!("refusing to overwrite built-in formation {}", formation.id);
        return None;
    }
    let mut slot_ids = BTreeSet::new();
    if !formation.slots.iter().all(|s| slot_ids.insert(s.id.as_str())) {
        return None;
    }

    let mut incoming = formation.clone();
    incoming.is_custom = true;
    let mut claimed = BTreeSet::new();
    for slot in &mut incoming.slots {
        let Some(player_id) = slot.player_id.clone() else {
            continue;
        };
        let bound_elsewhere = t
            .formations
            .iter()
            .any(|(fid, f)| *fid != incoming.id && f.slot_of(&player_id).is_some());
        let unavailable = t.player(&player_id).map_or(true, |p| p.loan.is_loaned);
        if unavailable || bound_elsewhere || !claimed.insert(player_id) {
            slot.player_id = None;
        }
    }

    if t.formations.get(&incoming.id) == Some(&incoming) {
        return None;
    }
    let mut next = t.clone();
    next.tactical_familiarity.entry(incoming.id.clone()).or_insert(0);
    Arc::make_mut(&mut next.formations).insert(incoming.id.clone(), incoming);
    Some(next)
}

pub fn delete_custom_formation(t: &TacticsState, formation_id: &str) -> Option<TacticsState> {
    if !t.formations.get(formation_id)?.is_custom {
        return None;
    }
    if t.side_of_formation(formation_id).is_some() {
        log::debug!("formation {} is active, not deleting", formation_id);
        return None;
    }
    let mut next = t.clone();
    Arc::make_mut(&mut next.formations).remove(formation_id);
    next.tactical_familiarity.remove(formation_id);
    Some(next)
}

// =============================================================================
// Team settings
// =============================================================================

pub fn set_team_tactic(t: &TacticsState, team: Team, change: TacticChange) -> Option<TacticsState> {
    let updated = t.team_tactics.get(team).with(change)?;
    let mut next = t.clone();
    *next.team_tactics.get_mut(team) = updated;
    Some(next)
}

/// Raise (or lower) familiarity with a formation, saturating at 0 and 100.
pub fn adjust_tactical_familiarity(t: &TacticsState, formation_id: &str, increase: i16) -> Option<TacticsState> {
    t.formations.get(formation_id)?;
    let current = t.tactical_familiarity.get(formation_id).copied().unwrap_or(0);
    let value = i16::from(current).saturating_add(increase).clamp(0, 100) as u8;
    if t.tactical_familiarity.get(formation_id) == Some(&value) {
        return None;
    }
    let mut next = t.clone();
    next.tactical_familiarity.insert(formation_id.to_string(), value);
    Some(next)
}

/// Captain of the player's own side.
pub fn set_captain(t: &TacticsState, player_id: &str) -> Option<TacticsState> {
    let side = t.player(player_id)?.team;
    if t.captain_ids.get(side).as_deref() == Some(player_id) {
        return None;
    }
    let mut next = t.clone();
    *next.captain_ids.get_mut(side) = Some(player_id.to_string());
    Some(next)
}

/// Assign (or clear with `None`) a set-piece taker. Takers must play for `team`.
pub fn set_set_piece_taker(
    t: &TacticsState,
    team: Team,
    kind: SetPieceType,
    player_id: Option<&str>,
) -> Option<TacticsState> {
    let current = t.set_piece_takers.get(team).get(&kind).map(String::as_str);
    if current == player_id {
        return None;
    }
    if let Some(id) = player_id {
        if t.player(id)?.team != team {
            return None;
        }
    }
    let mut next = t.clone();
    let takers = next.set_piece_takers.get_mut(team);
    match player_id {
        Some(id) => {
            takers.insert(kind, id.to_string());
        }
        None => {
            takers.remove(&kind);
        }
    }
    Some(next)
}

/// Move a player to the other squad. They lose any slot and side duties.
pub fn assign_player_team(t: &TacticsState, player_id: &str, team: Team) -> Option<TacticsState> {
    if t.player(player_id)?.team == team {
        return None;
    }
    let mut next = t.clone();
    unbind_everywhere(Arc::make_mut(&mut next.formations), player_id);
    set_team(&mut next, player_id, team);
    Some(next)
}

// =============================================================================
// Tests
// =============================================================================
