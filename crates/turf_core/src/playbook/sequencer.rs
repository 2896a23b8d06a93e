//! Playbook item / step editing and animation playback
//!
//! Every transition takes the whole [`RootState`] because playback reads and
//! writes live player positions (tactics) as well as the play-head (ui).
//! `None` means the request was rejected or changed nothing.
//!
//! Live edits belong to the active step. Whenever the play-head leaves a step
//! outside playback, live positions and drawings are baked into it first.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::trails::compute_trails;
use crate::data::library_play;
use crate::geometry::{PitchPos, Team};
use crate::models::{
    Drawing, PlayCategory, PlaybookEvent, PlaybookItem, PlaybookStep, PlayerId, PlayerRun, BallPath,
};
use crate::state::{RootState, TacticsState};

// =============================================================================
// Live state helpers
// =============================================================================

fn active(state: &RootState) -> Option<(&PlaybookItem, usize)> {
    let item = state.tactics.playbook.get(state.ui.active_playbook_item_id.as_deref()?)?;
    Some((item, state.ui.active_step_index?))
}

fn apply_positions(tactics: &mut Arc<TacticsState>, positions: &BTreeMap<PlayerId, PitchPos>) {
    let differs = tactics
        .players
        .iter()
        .any(|p| positions.get(&p.id).is_some_and(|pos| *pos != p.position));
    if !differs {
        return;
    }
    let t = Arc::make_mut(tactics);
    for p in Arc::make_mut(&mut t.players).iter_mut() {
        if let Some(pos) = positions.get(&p.id) {
            p.position = *pos;
        }
    }
}

fn apply_drawings(tactics: &mut Arc<TacticsState>, drawings: &[Drawing]) {
    if tactics.drawings.as_slice() == drawings {
        return;
    }
    Arc::make_mut(tactics).drawings = Arc::new(drawings.to_vec());
}

fn apply_step(tactics: &mut Arc<TacticsState>, step: &PlaybookStep) {
    apply_positions(tactics, &step.player_positions);
    apply_drawings(tactics, &step.drawings);
}

/// Write live positions and drawings into the active step (outside playback).
fn bake(next: &mut RootState) {
    if next.ui.is_animating {
        return;
    }
    let (Some(item_id), Some(index)) = (next.ui.active_playbook_item_id.clone(), next.ui.active_step_index) else {
        return;
    };
    let Some(step) = next.tactics.playbook.get(&item_id).and_then(|i| i.steps.get(index)) else {
        return;
    };
    let live = next.tactics.live_positions();
    if step.player_positions == live && step.drawings == *next.tactics.drawings {
        return;
    }

    let drawings = (*next.tactics.drawings).clone();
    let t = Arc::make_mut(&mut next.tactics);
    if let Some(step) = Arc::make_mut(&mut t.playbook)
        .get_mut(&item_id)
        .and_then(|i| i.steps.get_mut(index))
    {
        step.player_positions = live;
        step.drawings = drawings;
    }
}

/// Copy of `state` at rest: playback stopped and in-progress edits folded
/// into the active step.
pub fn at_rest(state: &RootState) -> RootState {
    let mut next = state.clone();
    halt(&mut next);
    bake(&mut next);
    next
}

/// Stop playback: restore the pre-playback positions and rewind to step 0.
fn halt(next: &mut RootState) {
    if !next.ui.is_animating {
        return;
    }
    let initial = next.ui.player_initial_positions.clone().unwrap_or_default();
    let first_step = active(next).and_then(|(item, _)| item.steps.first().cloned());

    let ui = Arc::make_mut(&mut next.ui);
    ui.is_animating = false;
    ui.is_paused = false;
    ui.player_initial_positions = None;
    ui.animation_trails.clear();
    if ui.active_playbook_item_id.is_some() {
        ui.active_step_index = Some(0);
    }

    apply_positions(&mut next.tactics, &initial);
    if let Some(step) = first_step {
        apply_drawings(&mut next.tactics, &step.drawings);
    }
}

fn live_step(tactics: &TacticsState, step_id: &str) -> PlaybookStep {
    PlaybookStep {
        id: step_id.to_string(),
        player_positions: tactics.live_positions(),
        drawings: (*tactics.drawings).clone(),
        ..Default::default()
    }
}

fn edit_active_item(next: &mut RootState, f: impl FnOnce(&mut PlaybookItem)) {
    let Some(item_id) = next.ui.active_playbook_item_id.clone() else {
        return;
    };
    let t = Arc::make_mut(&mut next.tactics);
    if let Some(item) = Arc::make_mut(&mut t.playbook).get_mut(&item_id) {
        f(item);
    }
}

// =============================================================================
// Items
// =============================================================================

/// New item seeded with one step holding the live positions and drawings.
pub fn create_item(
    state: &RootState,
    item_id: &str,
    step_id: &str,
    name: &str,
    category: PlayCategory,
) -> Option<RootState> {
    if name.trim().is_empty() || state.tactics.playbook.contains_key(item_id) {
        return None;
    }
    let mut next = state.clone();
    halt(&mut next);
    bake(&mut next);

    let item = PlaybookItem {
        id: item_id.to_string(),
        name: name.trim().to_string(),
        category,
        formation_id: next.tactics.active_formation_ids.get(Team::Home).clone(),
        steps: vec![live_step(&next.tactics, step_id)],
    };
    let t = Arc::make_mut(&mut next.tactics);
    Arc::make_mut(&mut t.playbook).insert(item.id.clone(), item);

    let ui = Arc::make_mut(&mut next.ui);
    ui.active_playbook_item_id = Some(item_id.to_string());
    ui.active_step_index = Some(0);
    Some(next)
}

pub fn load_item(state: &RootState, item_id: &str) -> Option<RootState> {
    let first = state.tactics.playbook.get(item_id)?.steps.first()?.clone();
    if state.ui.active_playbook_item_id.as_deref() == Some(item_id) && !state.ui.is_animating {
        return None;
    }
    let mut next = state.clone();
    halt(&mut next);
    bake(&mut next);

    let ui = Arc::make_mut(&mut next.ui);
    ui.active_playbook_item_id = Some(item_id.to_string());
    ui.active_step_index = Some(0);
    apply_step(&mut next.tactics, &first);
    Some(next)
}

pub fn delete_item(state: &RootState, item_id: &str) -> Option<RootState> {
    if !state.tactics.playbook.contains_key(item_id) {
        return None;
    }
    let mut next = state.clone();
    if next.ui.active_playbook_item_id.as_deref() == Some(item_id) {
        halt(&mut next);
        let ui = Arc::make_mut(&mut next.ui);
        ui.active_playbook_item_id = None;
        ui.active_step_index = None;
    }
    let t = Arc::make_mut(&mut next.tactics);
    Arc::make_mut(&mut t.playbook).remove(item_id);
    Some(next)
}

pub fn duplicate_item(state: &RootState, item_id: &str, new_id: &str) -> Option<RootState> {
    if state.tactics.playbook.contains_key(new_id) || !state.tactics.playbook.contains_key(item_id) {
        return None;
    }
    let mut next = state.clone();
    bake(&mut next);
    let mut copy = next.tactics.playbook.get(item_id)?.clone();
    copy.id = new_id.to_string();
    copy.name = format!("{} (Copy)", copy.name);
    let t = Arc::make_mut(&mut next.tactics);
    Arc::make_mut(&mut t.playbook).insert(copy.id.clone(), copy);
    Some(next)
}

/// Copy a built-in library play into the playbook under `new_id`.
pub fn add_library_play(state: &RootState, library_id: &str, new_id: &str) -> Option<RootState> {
    if state.tactics.playbook.contains_key(new_id) {
        return None;
    }
    let mut item = library_play(library_id)?.clone();
    item.id = new_id.to_string();

    let mut next = state.clone();
    let t = Arc::make_mut(&mut next.tactics);
    Arc::make_mut(&mut t.playbook).insert(item.id.clone(), item);
    Some(next)
}

/// Replace the whole playbook (project import). Closes any active item.
pub fn load_playbook(state: &RootState, items: &[PlaybookItem]) -> Option<RootState> {
    let playbook: BTreeMap<String, PlaybookItem> = items
        .iter()
        .filter(|item| !item.steps.is_empty())
        .map(|item| (item.id.clone(), item.clone()))
        .collect();
    if *state.tactics.playbook == playbook {
        return None;
    }
    let mut next = state.clone();
    halt(&mut next);
    let ui = Arc::make_mut(&mut next.ui);
    ui.active_playbook_item_id = None;
    ui.active_step_index = None;
    Arc::make_mut(&mut next.tactics).playbook = Arc::new(playbook);
    Some(next)
}

/// Leave the playbook view. Edits are baked, playback is stopped.
pub fn close_playbook(state: &RootState) -> Option<RootState> {
    state.ui.active_playbook_item_id.as_ref()?;
    let mut next = state.clone();
    halt(&mut next);
    bake(&mut next);
    let ui = Arc::make_mut(&mut next.ui);
    ui.active_playbook_item_id = None;
    ui.active_step_index = None;
    Some(next)
}

pub fn toggle_category(state: &RootState, category: PlayCategory) -> RootState {
    let mut next = state.clone();
    let ui = Arc::make_mut(&mut next.ui);
    let visible = ui.category_visible(category);
    ui.playbook_categories.insert(category, !visible);
    next
}

// =============================================================================
// Steps
// =============================================================================

/// Move the play-head. Out-of-range indices are rejected. Allowed while
/// paused (scrubbing) but not while playing.
pub fn set_active_step(state: &RootState, index: usize) -> Option<RootState> {
    let (item, current) = active(state)?;
    if index >= item.steps.len() {
        log::warn!("step {} out of range for {} ({} steps)", index, item.id, item.steps.len());
        return None;
    }
    if index == current || state.ui.is_playing() {
        return None;
    }
    let target = item.steps[index].clone();

    let mut next = state.clone();
    bake(&mut next);
    let ui = Arc::make_mut(&mut next.ui);
    ui.active_step_index = Some(index);
    ui.animation_trails.clear();
    apply_step(&mut next.tactics, &target);
    Some(next)
}

/// Insert a snapshot of the live state right after the active step.
pub fn add_step(state: &RootState, step_id: &str) -> Option<RootState> {
    let (item, current) = active(state)?;
    if state.ui.is_animating || item.steps.iter().any(|s| s.id == step_id) {
        return None;
    }
    let mut next = state.clone();
    bake(&mut next);
    let step = live_step(&next.tactics, step_id);
    let insert_at = (current + 1).min(item.steps.len());
    edit_active_item(&mut next, |item| item.steps.insert(insert_at, step));
    Arc::make_mut(&mut next.ui).active_step_index = Some(insert_at);
    Some(next)
}

/// Remove a step. The last remaining step cannot be deleted.
pub fn delete_step(state: &RootState, index: usize) -> Option<RootState> {
    let (item, current) = active(state)?;
    if state.ui.is_animating || item.steps.len() <= 1 || index >= item.steps.len() {
        return None;
    }
    let remaining = item.steps.len() - 1;

    let mut next = state.clone();
    if index != current {
        bake(&mut next);
    }
    edit_active_item(&mut next, |item| {
        item.steps.remove(index);
    });

    let new_current = match current {
        c if c > index => c - 1,
        c if c == index => index.min(remaining - 1),
        c => c,
    };
    Arc::make_mut(&mut next.ui).active_step_index = Some(new_current);
    if current == index {
        let step = active(&next).and_then(|(item, i)| item.steps.get(i).cloned())?;
        apply_step(&mut next.tactics, &step);
    }
    Some(next)
}

fn edit_step(state: &RootState, index: usize, f: impl FnOnce(&mut PlaybookStep)) -> Option<RootState> {
    let (item, _) = active(state)?;
    let mut step = item.steps.get(index)?.clone();
    f(&mut step);
    if item.steps[index] == step {
        return None;
    }
    let mut next = state.clone();
    edit_active_item(&mut next, |item| item.steps[index] = step);
    Some(next)
}

pub fn set_event(state: &RootState, step_index: usize, event: Option<PlaybookEvent>) -> Option<RootState> {
    edit_step(state, step_index, |step| step.event = event)
}

/// Set the run drawn for `player_id` on a step. Empty `points` removes it.
pub fn set_player_run(
    state: &RootState,
    step_index: usize,
    player_id: &str,
    points: &[PitchPos],
) -> Option<RootState> {
    state.tactics.player(player_id)?;
    edit_step(state, step_index, |step| {
        step.player_runs.retain(|r| r.player_id != player_id);
        if !points.is_empty() {
            step.player_runs.push(PlayerRun { player_id: player_id.to_string(), points: points.to_vec() });
        }
    })
}

pub fn set_ball_path(state: &RootState, step_index: usize, points: &[PitchPos]) -> Option<RootState> {
    edit_step(state, step_index, |step| {
        step.ball_path = (!points.is_empty()).then(|| BallPath { points: points.to_vec() });
    })
}

// =============================================================================
// Playback
// =============================================================================

/// Rewind to step 0 and start playing. The positions at step 0 are kept as
/// the restore point for when playback ends.
pub fn start_animation(state: &RootState) -> Option<RootState> {
    let (item, _) = active(state)?;
    if state.ui.is_animating {
        return None;
    }
    let first = item.steps.first()?.clone();

    let mut next = state.clone();
    bake(&mut next);
    apply_step(&mut next.tactics, &first);
    let initial = next.tactics.live_positions();

    let ui = Arc::make_mut(&mut next.ui);
    ui.active_step_index = Some(0);
    ui.is_animating = true;
    ui.is_paused = false;
    ui.player_initial_positions = Some(initial);
    ui.animation_trails.clear();
    Some(next)
}

pub fn pause_animation(state: &RootState) -> Option<RootState> {
    if !state.ui.is_playing() {
        return None;
    }
    let mut next = state.clone();
    Arc::make_mut(&mut next.ui).is_paused = true;
    Some(next)
}

pub fn resume_animation(state: &RootState) -> Option<RootState> {
    if !(state.ui.is_animating && state.ui.is_paused) {
        return None;
    }
    let mut next = state.clone();
    Arc::make_mut(&mut next.ui).is_paused = false;
    Some(next)
}

pub fn reset_animation(state: &RootState) -> Option<RootState> {
    if !state.ui.is_animating {
        return None;
    }
    let mut next = state.clone();
    halt(&mut next);
    Some(next)
}

/// Timer tick fired for `item_id` while the play-head was at `from_step`.
///
/// Stale ticks (other item, moved play-head, paused, stopped) are ignored.
/// Reaching the last step does not stop playback: the last step is held for
/// one more interval and its own tick ends playback, so an N-step play takes
/// exactly N ticks.
pub fn tick(state: &RootState, item_id: &str, from_step: usize) -> Option<RootState> {
    let (item, current) = active(state)?;
    if !state.ui.is_playing() || item.id != item_id || current != from_step {
        log::debug!("stale animation tick for {}@{}", item_id, from_step);
        return None;
    }

    let mut next = state.clone();
    match (item.steps.get(from_step), item.steps.get(from_step + 1)) {
        (Some(prev), Some(step)) => {
            let trails = compute_trails(prev, step);
            let step = step.clone();
            let ui = Arc::make_mut(&mut next.ui);
            ui.active_step_index = Some(from_step + 1);
            ui.animation_trails = trails;
            apply_step(&mut next.tactics, &step);
        }
        _ => halt(&mut next),
    }
    Some(next)
}
