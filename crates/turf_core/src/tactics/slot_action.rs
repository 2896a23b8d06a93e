//! Slot Action Resolver
//!
//! `idle -> menuOpen(..) -> resolved(decision)`. The open menu lives in
//! `UiState::slot_action_menu`; at most one exists at a time. Resolving
//! against players that have since disappeared closes the menu and changes
//! nothing else.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::slots;
use crate::models::{LoanRequest, ModalType, SlotActionMenu, UiState};
use crate::state::{RootState, TacticsState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotDecision {
    Swap,
    Replace,
    Bench,
    Captain,
    Loan,
}

/// Open `menu`, discarding any pending one.
pub fn open_menu(ui: &UiState, menu: &SlotActionMenu) -> Option<UiState> {
    if ui.slot_action_menu.as_ref() == Some(menu) {
        return None;
    }
    let mut next = ui.clone();
    next.slot_action_menu = Some(menu.clone());
    next.active_modal = Some(ModalType::SlotActionMenu);
    Some(next)
}

pub fn close_menu(ui: &UiState) -> Option<UiState> {
    ui.slot_action_menu.as_ref()?;
    let mut next = ui.clone();
    next.slot_action_menu = None;
    if next.active_modal == Some(ModalType::SlotActionMenu) {
        next.active_modal = None;
    }
    Some(next)
}

/// Formation and slot the menu points at: the active formation whose
/// `target_slot_id` holds the target player, else the source's own side.
fn locate_target<'a>(t: &'a TacticsState, menu: &SlotActionMenu) -> Option<&'a str> {
    if let Some(target_id) = menu.target_player_id.as_deref() {
        let hit = t.active_formation_ids.iter().find(|(_, fid)| {
            t.formations
                .get(fid.as_str())
                .and_then(|f| f.slot(&menu.target_slot_id))
                .is_some_and(|s| s.player_id.as_deref() == Some(target_id))
        });
        if let Some((_, fid)) = hit {
            return Some(fid.as_str());
        }
    }
    let side = t.player(&menu.source_player_id)?.team;
    Some(t.active_formation_ids.get(side).as_str())
}

fn decide(t: &TacticsState, ui: &UiState, menu: &SlotActionMenu, decision: SlotDecision) -> Option<TacticsState> {
    let mode = ui.positioning_mode;
    let source = menu.source_player_id.as_str();
    match decision {
        SlotDecision::Swap => {
            let formation_id = locate_target(t, menu)?;
            let holder = t.formations.get(formation_id)?.slot(&menu.target_slot_id)?.player_id.clone();
            match holder {
                Some(holder) => slots::swap_players(t, mode, source, &holder),
                None => slots::replace_in_slot(t, mode, source, formation_id, &menu.target_slot_id),
            }
        }
        SlotDecision::Replace => {
            let formation_id = locate_target(t, menu)?;
            slots::replace_in_slot(t, mode, source, formation_id, &menu.target_slot_id)
        }
        SlotDecision::Bench => slots::bench_player(t, source),
        SlotDecision::Captain => slots::set_captain(t, source),
        SlotDecision::Loan => None,
    }
}

/// Apply `decision` to the open menu and close it.
///
/// Returns `None` when no menu is open.
pub fn resolve(state: &RootState, decision: SlotDecision) -> Option<RootState> {
    let menu = state.ui.slot_action_menu.clone()?;
    let mut closed_ui = close_menu(&state.ui)?;
    let mut next = state.clone();

    let t = &state.tactics;
    let source_exists = t.player(&menu.source_player_id).is_some();
    let target_exists = menu.target_player_id.as_deref().map_or(true, |id| t.player(id).is_some());
    if !source_exists || !target_exists {
        log::debug!("slot menu for {} resolved against stale players", menu.source_player_id);
        next.ui = Arc::new(closed_ui);
        return Some(next);
    }

    // The slot must still hold the player the menu was opened for.
    if let (Some(target_id), Some(formation_id)) = (menu.target_player_id.as_deref(), locate_target(t, &menu)) {
        let holder = t
            .formations
            .get(formation_id)
            .and_then(|f| f.slot(&menu.target_slot_id))
            .and_then(|s| s.player_id.as_deref());
        if holder.is_some() && holder != Some(target_id) && decision != SlotDecision::Captain {
            log::debug!("slot {} changed hands while the menu was open", menu.target_slot_id);
            next.ui = Arc::new(closed_ui);
            return Some(next);
        }
    }

    if decision == SlotDecision::Loan {
        closed_ui.pending_loan_request = Some(LoanRequest { player_id: menu.source_player_id.clone() });
    }
    if let Some(tactics) = decide(t, &state.ui, &menu, decision) {
        next.tactics = Arc::new(tactics);
    }
    next.ui = Arc::new(closed_ui);
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MenuTrigger, ScreenPos};
    use crate::state::RootState;

    fn menu(source: &str, slot: &str, target: Option<&str>) -> SlotActionMenu {
        SlotActionMenu {
            source_player_id: source.into(),
            target_slot_id: slot.into(),
            target_player_id: target.map(Into::into),
            trigger: MenuTrigger::Drag,
            position: ScreenPos { x: 120.0, y: 340.0 },
        }
    }

    fn with_menu(state: &RootState, m: &SlotActionMenu) -> RootState {
        let mut next = state.clone();
        next.ui = Arc::new(open_menu(&state.ui, m).unwrap());
        next
    }

    fn bound(state: &RootState, formation: &str, slot: &str) -> Option<String> {
        state.tactics.formations[formation].slot(slot).unwrap().player_id.clone()
    }

    #[test]
    fn test_swap_scenario_442() {
        let state = RootState::initial();
        assert_eq!(bound(&state, "4-4-2", "s1").as_deref(), Some("p1"));

        // rebind s2 to p4 first: p4 leaves s4, p2 goes to the bench
        let t = slots::bench_player(&state.tactics, "p2").unwrap();
        let t = slots::assign_player_to_slot(&t, Default::default(), "s2", "p4", crate::geometry::Team::Home).unwrap();
        let mut state = state.clone();
        state.tactics = Arc::new(t);
        assert_eq!(bound(&state, "4-4-2", "s2").as_deref(), Some("p4"));

        let state = with_menu(&state, &menu("p1", "s2", Some("p4")));
        let next = resolve(&state, SlotDecision::Swap).unwrap();
        assert_eq!(bound(&next, "4-4-2", "s1").as_deref(), Some("p4"));
        assert_eq!(bound(&next, "4-4-2", "s2").as_deref(), Some("p1"));
        assert!(next.ui.slot_action_menu.is_none());
        assert_eq!(next.ui.active_modal, None);
    }

    #[test]
    fn test_opening_replaces_pending_menu() {
        let state = RootState::initial();
        let first = with_menu(&state, &menu("p1", "s2", Some("p2")));
        let second = with_menu(&first, &menu("p23", "s7", Some("p7")));
        let open = second.ui.slot_action_menu.as_ref().unwrap();
        assert_eq!(open.source_player_id, "p23");
    }

    #[test]
    fn test_replace_and_bench() {
        let state = RootState::initial();
        let open = with_menu(&state, &menu("p23", "s7", Some("p7")));
        let next = resolve(&open, SlotDecision::Replace).unwrap();
        assert_eq!(bound(&next, "4-4-2", "s7").as_deref(), Some("p23"));
        assert!(next.tactics.binding_of("p7").is_none());

        let open = with_menu(&next, &menu("p23", "s7", Some("p23")));
        let benched = resolve(&open, SlotDecision::Bench).unwrap();
        assert_eq!(bound(&benched, "4-4-2", "s7"), None);
    }

    #[test]
    fn test_captain_and_loan() {
        let state = RootState::initial();
        let open = with_menu(&state, &menu("p9", "s9", Some("p9")));
        let next = resolve(&open, SlotDecision::Captain).unwrap();
        assert_eq!(next.tactics.captain_ids.home.as_deref(), Some("p9"));
        assert_eq!(bound(&next, "4-4-2", "s9").as_deref(), Some("p9"));

        let open = with_menu(&state, &menu("p9", "s9", Some("p9")));
        let next = resolve(&open, SlotDecision::Loan).unwrap();
        assert!(Arc::ptr_eq(&next.tactics, &state.tactics));
        assert_eq!(next.ui.pending_loan_request.as_ref().unwrap().player_id, "p9");
    }

    #[test]
    fn test_stale_player_closes_silently() {
        let state = RootState::initial();
        let open = with_menu(&state, &menu("ghost", "s2", Some("p2")));
        let next = resolve(&open, SlotDecision::Swap).unwrap();
        assert!(next.ui.slot_action_menu.is_none());
        assert!(Arc::ptr_eq(&next.tactics, &state.tactics));

        let open = with_menu(&state, &menu("p23", "s2", Some("sold")));
        let next = resolve(&open, SlotDecision::Replace).unwrap();
        assert!(Arc::ptr_eq(&next.tactics, &state.tactics));
    }

    #[test]
    fn test_resolve_without_menu_is_none() {
        let state = RootState::initial();
        assert!(resolve(&state, SlotDecision::Swap).is_none());
    }
}
