//! Franchise transitions
//!
//! Week advance, transfers, loans, mentoring and relationships. These cross
//! subtrees (a sale touches the roster, every formation, the playbook and the
//! UI selection), so they work on the whole [`RootState`].

use std::sync::Arc;

use crate::geometry::Team;
use crate::models::{MatchResult, MentoringGroup, ModalType, NegotiationData, Player, Relationship};
use crate::state::{RootState, TacticsState};
use crate::tactics::chemistry::bump;

/// Chemistry gained per week by every pair of starters on the same side.
const WEEKLY_CHEMISTRY_GAIN: u8 = 1;

// =============================================================================
// Season
// =============================================================================

/// Next game week. Starters who played together grow closer.
pub fn advance_week(state: &RootState) -> RootState {
    let mut next = state.clone();
    Arc::make_mut(&mut next.franchise).game_week += 1;

    let mut chemistry = (*state.tactics.chemistry).clone();
    let mut changed = false;
    for team in [Team::Home, Team::Away] {
        let starters: Vec<&str> = state.tactics.starters(team).into_iter().map(|p| p.id.as_str()).collect();
        for (i, a) in starters.iter().enumerate() {
            for b in &starters[i + 1..] {
                changed |= bump(&mut chemistry, a, b, WEEKLY_CHEMISTRY_GAIN);
            }
        }
    }
    if changed {
        Arc::make_mut(&mut next.tactics).chemistry = Arc::new(chemistry);
    }
    next
}

pub fn record_match_result(state: &RootState, result: &MatchResult) -> RootState {
    let mut next = state.clone();
    Arc::make_mut(&mut next.franchise).last_match_result = Some(result.clone());
    next
}

/// Restore stamina (and shed fatigue) for every player on `team`.
pub fn recover_stamina(state: &RootState, team: Team, amount: u8) -> Option<RootState> {
    let needs = |p: &Player| p.team == team && (p.stamina < 100 || p.fatigue > 0);
    if amount == 0 || !state.tactics.players.iter().any(needs) {
        return None;
    }
    let mut next = state.clone();
    let t = Arc::make_mut(&mut next.tactics);
    for p in Arc::make_mut(&mut t.players).iter_mut().filter(|p| p.team == team) {
        p.stamina = p.stamina.saturating_add(amount).min(100);
        p.fatigue = p.fatigue.saturating_sub(amount);
    }
    Some(next)
}

// =============================================================================
// Mentoring / relationships
// =============================================================================

/// Register a mentoring group. Every member must be on `team` and not
/// already part of another group there.
pub fn create_mentoring_group(state: &RootState, team: Team, group: &MentoringGroup) -> Option<RootState> {
    let t = &state.tactics;
    let on_team = |id: &str| t.player(id).is_some_and(|p| p.team == team);
    if group.mentee_ids.is_empty()
        || !on_team(&group.mentor_id)
        || group.mentee_ids.iter().any(|id| !on_team(id) || *id == group.mentor_id)
    {
        return None;
    }
    let groups = state.franchise.mentoring_groups.get(team);
    let taken = |id: &str| groups.iter().any(|g| g.contains(id));
    if taken(&group.mentor_id) || group.mentee_ids.iter().any(|id| taken(id)) {
        log::debug!("mentoring group for {} overlaps an existing group", group.mentor_id);
        return None;
    }

    let mut next = state.clone();
    Arc::make_mut(&mut next.franchise).mentoring_groups.get_mut(team).push(group.clone());
    Some(next)
}

pub fn dissolve_mentoring_group(state: &RootState, team: Team, mentor_id: &str) -> Option<RootState> {
    if !state.franchise.mentoring_groups.get(team).iter().any(|g| g.mentor_id == mentor_id) {
        return None;
    }
    let mut next = state.clone();
    Arc::make_mut(&mut next.franchise)
        .mentoring_groups
        .get_mut(team)
        .retain(|g| g.mentor_id != mentor_id);
    Some(next)
}

/// Set (or clear, with `None`) the relationship between two players.
/// Stored once, under `a`; any entry in the other direction is dropped.
pub fn set_relationship(state: &RootState, a: &str, b: &str, relationship: Option<Relationship>) -> Option<RootState> {
    if a == b || state.tactics.player(a).is_none() || state.tactics.player(b).is_none() {
        return None;
    }
    let current = state.franchise.relationships.get(a).and_then(|m| m.get(b)).copied();
    let reverse = state.franchise.relationships.get(b).and_then(|m| m.get(a)).copied();
    if current == relationship && reverse.is_none() {
        return None;
    }

    let mut next = state.clone();
    let table = &mut Arc::make_mut(&mut next.franchise).relationships;
    if let Some(row) = table.get_mut(b) {
        row.remove(a);
    }
    match relationship {
        Some(r) => {
            table.entry(a.to_string()).or_default().insert(b.to_string(), r);
        }
        None => {
            if let Some(row) = table.get_mut(a) {
                row.remove(b);
            }
        }
    }
    table.retain(|_, row| !row.is_empty());
    Some(next)
}

// =============================================================================
// Transfers / loans
// =============================================================================

/// Remove every reference to `player_id` from tactics.
fn purge_tactics(t: &mut TacticsState, player_id: &str) {
    Arc::make_mut(&mut t.players).retain(|p| p.id != player_id);
    for formation in Arc::make_mut(&mut t.formations).values_mut() {
        formation.unbind(player_id);
    }
    for team in [Team::Home, Team::Away] {
        let captain = t.captain_ids.get_mut(team);
        if captain.as_deref() == Some(player_id) {
            *captain = None;
        }
        t.set_piece_takers.get_mut(team).retain(|_, id| id != player_id);
    }

    let chemistry = Arc::make_mut(&mut t.chemistry);
    chemistry.remove(player_id);
    for row in chemistry.values_mut() {
        row.remove(player_id);
    }
    chemistry.retain(|_, row| !row.is_empty());

    for item in Arc::make_mut(&mut t.playbook).values_mut() {
        for step in &mut item.steps {
            step.player_positions.remove(player_id);
            step.player_runs.retain(|r| r.player_id != player_id);
        }
    }
}

/// Sell a player: gone from the roster and from everything that pointed at
/// them. The fee goes to the selling side's budget.
pub fn sell_player(state: &RootState, player_id: &str, fee: i64) -> Option<RootState> {
    let team = state.tactics.player(player_id)?.team;
    if fee < 0 {
        return None;
    }
    let Some(budget) = state.franchise.transfer_budgets.get(team).checked_add(fee) else {
        log::warn!("fee {} for {} overflows the {:?} budget", fee, player_id, team);
        return None;
    };
    let mut next = state.clone();
    purge_tactics(Arc::make_mut(&mut next.tactics), player_id);

    let franchise = Arc::make_mut(&mut next.franchise);
    *franchise.transfer_budgets.get_mut(team) = budget;
    for side in [Team::Home, Team::Away] {
        let groups = franchise.mentoring_groups.get_mut(side);
        groups.retain(|g| g.mentor_id != player_id);
        for g in groups.iter_mut() {
            g.mentee_ids.retain(|id| id != player_id);
        }
        groups.retain(|g| !g.mentee_ids.is_empty());
    }
    franchise.relationships.remove(player_id);
    for row in franchise.relationships.values_mut() {
        row.remove(player_id);
    }
    franchise.relationships.retain(|_, row| !row.is_empty());
    if franchise.negotiation_data.as_ref().is_some_and(|n| n.player_id == player_id) {
        franchise.negotiation_data = None;
    }

    let ui = Arc::make_mut(&mut next.ui);
    for slot in [&mut ui.selected_player_id, &mut ui.editing_player_id, &mut ui.player_to_compare_id] {
        if slot.as_deref() == Some(player_id) {
            *slot = None;
        }
    }
    let menu_refs = ui.slot_action_menu.as_ref().is_some_and(|m| {
        m.source_player_id == player_id || m.target_player_id.as_deref() == Some(player_id)
    });
    if menu_refs {
        ui.slot_action_menu = None;
        if ui.active_modal == Some(ModalType::SlotActionMenu) {
            ui.active_modal = None;
        }
    }
    if ui.pending_loan_request.as_ref().is_some_and(|r| r.player_id == player_id) {
        ui.pending_loan_request = None;
    }
    if let Some(initial) = ui.player_initial_positions.as_mut() {
        initial.remove(player_id);
    }
    Some(next)
}

/// Sign a player onto the bench. Rejected when the id is taken or the
/// buying side cannot afford `fee`.
pub fn sign_player(state: &RootState, player: &Player, fee: i64) -> Option<RootState> {
    if state.tactics.player(&player.id).is_some() {
        return None;
    }
    let budget = *state.franchise.transfer_budgets.get(player.team);
    if fee < 0 || fee > budget {
        log::debug!("cannot afford {} for {} (budget {})", fee, player.id, budget);
        return None;
    }
    let mut next = state.clone();
    *Arc::make_mut(&mut next.franchise).transfer_budgets.get_mut(player.team) -= fee;
    let t = Arc::make_mut(&mut next.tactics);
    let mut signed = player.clone();
    signed.loan = Default::default();
    Arc::make_mut(&mut t.players).push(signed);
    Some(next)
}

/// Send a player out on loan. They leave every slot and cannot be bound
/// until recalled.
pub fn loan_player(state: &RootState, player_id: &str, club: &str) -> Option<RootState> {
    if state.tactics.player(player_id)?.loan.is_loaned || club.trim().is_empty() {
        return None;
    }
    let mut next = state.clone();
    let t = Arc::make_mut(&mut next.tactics);
    for formation in Arc::make_mut(&mut t.formations).values_mut() {
        formation.unbind(player_id);
    }
    if let Some(p) = Arc::make_mut(&mut t.players).iter_mut().find(|p| p.id == player_id) {
        p.loan.is_loaned = true;
        p.loan.loaned_to = Some(club.trim().to_string());
    }
    if state.ui.pending_loan_request.as_ref().is_some_and(|r| r.player_id == player_id) {
        Arc::make_mut(&mut next.ui).pending_loan_request = None;
    }
    Some(next)
}

pub fn recall_player(state: &RootState, player_id: &str) -> Option<RootState> {
    if !state.tactics.player(player_id)?.loan.is_loaned {
        return None;
    }
    let mut next = state.clone();
    let t = Arc::make_mut(&mut next.tactics);
    if let Some(p) = Arc::make_mut(&mut t.players).iter_mut().find(|p| p.id == player_id) {
        p.loan = Default::default();
    }
    Some(next)
}

pub fn start_negotiation(state: &RootState, player_id: &str) -> Option<RootState> {
    state.tactics.player(player_id)?;
    let mut next = state.clone();
    Arc::make_mut(&mut next.franchise).negotiation_data =
        Some(NegotiationData { player_id: player_id.to_string(), conversation: Vec::new() });
    Some(next)
}

pub fn end_negotiation(state: &RootState) -> Option<RootState> {
    state.franchise.negotiation_data.as_ref()?;
    let mut next = state.clone();
    Arc::make_mut(&mut next.franchise).negotiation_data = None;
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlayCategory;
    use crate::playbook::sequencer;
    use crate::tactics::chemistry::table_score;

    #[test]
    fn test_advance_week_builds_starter_chemistry() {
        let state = RootState::initial();
        let next = advance_week(&state);
        assert_eq!(next.franchise.game_week, 2);
        assert_eq!(table_score(&next.tactics.chemistry, "p3", "p4"), Some(89));
        assert_eq!(table_score(&next.tactics.chemistry, "p2", "p5"), Some(51));
        // bench players and cross-side pairs untouched
        assert_eq!(table_score(&next.tactics.chemistry, "p23", "p1"), None);
        assert_eq!(table_score(&next.tactics.chemistry, "p1", "p12"), None);
    }

    #[test]
    fn test_sell_purges_every_reference() {
        let state = RootState::initial();
        let state = sequencer::create_item(&state, "play", "st0", "Shape", PlayCategory::General).unwrap();
        let next = sell_player(&state, "p2", 12_000_000).unwrap();

        let t = &next.tactics;
        assert!(t.player("p2").is_none());
        assert!(t.binding_of("p2").is_none());
        assert_eq!(t.captain_ids.home, None);
        assert!(!t.playbook["play"].steps[0].player_positions.contains_key("p2"));
        assert_eq!(next.franchise.relationship("p2", "p6"), None);
        assert_eq!(next.franchise.transfer_budgets.home, 62_000_000);
        assert!(sell_player(&next, "p2", 1).is_none());
    }

    #[test]
    fn test_sell_rejects_negative_or_overflowing_fee() {
        let state = RootState::initial();
        assert!(sell_player(&state, "p23", -1).is_none());
        assert!(sell_player(&state, "p23", i64::MAX).is_none());

        let next = crate::state::reduce(
            &state,
            &crate::state::Action::SellPlayer { player_id: "p23".into(), fee: i64::MAX },
        );
        assert!(next.same_as(&state));
    }

    #[test]
    fn test_sell_with_slot_menu_open_closes_modal() {
        use crate::models::{MenuTrigger, ScreenPos, SlotActionMenu};
        use crate::tactics::slot_action;

        let mut state = RootState::initial();
        let menu = SlotActionMenu {
            source_player_id: "p23".into(),
            target_slot_id: "s7".into(),
            target_player_id: Some("p7".into()),
            trigger: MenuTrigger::Drag,
            position: ScreenPos { x: 200.0, y: 150.0 },
        };
        state.ui = Arc::new(slot_action::open_menu(&state.ui, &menu).unwrap());
        assert_eq!(state.ui.active_modal, Some(ModalType::SlotActionMenu));

        let next = sell_player(&state, "p7", 1_000_000).unwrap();
        assert!(next.ui.slot_action_menu.is_none());
        assert_eq!(next.ui.active_modal, None);
        assert!(next.tactics.binding_of("p23").is_none());
    }

    #[test]
    fn test_sell_mentor_dissolves_group() {
        let state = RootState::initial();
        let next = sell_player(&state, "p17", 0).unwrap();
        assert!(next.franchise.mentoring_groups.away.is_empty());
        let next = sell_player(&state, "p18", 0).unwrap();
        assert_eq!(next.franchise.mentoring_groups.away[0].mentee_ids, vec!["p19".to_string()]);
    }

    #[test]
    fn test_sign_respects_budget() {
        let state = RootState::initial();
        let mut recruit = state.tactics.player("p23").unwrap().clone();
        recruit.id = "p99".into();
        assert!(sign_player(&state, &recruit, 60_000_000).is_none());
        let next = sign_player(&state, &recruit, 20_000_000).unwrap();
        assert_eq!(next.franchise.transfer_budgets.home, 30_000_000);
        assert!(next.tactics.binding_of("p99").is_none());
        assert!(sign_player(&next, &recruit, 0).is_none());
    }

    #[test]
    fn test_loan_unbinds_and_recall_restores() {
        let state = RootState::initial();
        let next = loan_player(&state, "p7", "Rovers").unwrap();
        let p7 = next.tactics.player("p7").unwrap();
        assert!(p7.loan.is_loaned);
        assert_eq!(p7.loan.loaned_to.as_deref(), Some("Rovers"));
        assert!(next.tactics.binding_of("p7").is_none());
        assert!(loan_player(&next, "p7", "Rovers").is_none());

        let back = recall_player(&next, "p7").unwrap();
        assert!(!back.tactics.player("p7").unwrap().loan.is_loaned);
        assert!(recall_player(&back, "p7").is_none());
    }

    #[test]
    fn test_mentoring_groups_do_not_overlap() {
        let state = RootState::initial();
        let overlapping = MentoringGroup { mentor_id: "p9".into(), mentee_ids: vec!["p11".into()] };
        assert!(create_mentoring_group(&state, Team::Home, &overlapping).is_none());

        let cross_side = MentoringGroup { mentor_id: "p9".into(), mentee_ids: vec!["p12".into()] };
        assert!(create_mentoring_group(&state, Team::Home, &cross_side).is_none());

        let group = MentoringGroup { mentor_id: "p9".into(), mentee_ids: vec!["p23".into()] };
        let next = create_mentoring_group(&state, Team::Home, &group).unwrap();
        assert_eq!(next.franchise.mentoring_groups.home.len(), 2);

        let next = dissolve_mentoring_group(&next, Team::Home, "p9").unwrap();
        assert_eq!(next.franchise.mentoring_groups.home.len(), 1);
        assert!(dissolve_mentoring_group(&next, Team::Home, "p9").is_none());
    }

    #[test]
    fn test_relationship_single_direction() {
        let state = RootState::initial();
        let next = set_relationship(&state, "p6", "p2", Some(Relationship::Rivalry)).unwrap();
        assert_eq!(next.franchise.relationship("p2", "p6"), Some(Relationship::Rivalry));
        assert!(next.franchise.relationships.get("p2").is_none());

        let cleared = set_relationship(&next, "p6", "p2", None).unwrap();
        assert_eq!(cleared.franchise.relationship("p2", "p6"), None);
        assert!(set_relationship(&state, "p2", "p2", Some(Relationship::Friendship)).is_none());
    }

    #[test]
    fn test_recover_stamina_caps() {
        let mut state = RootState::initial();
        {
            let t = Arc::make_mut(&mut state.tactics);
            let p = Arc::make_mut(&mut t.players).iter_mut().find(|p| p.id == "p5").unwrap();
            p.stamina = 95;
            p.fatigue = 30;
        }
        let next = recover_stamina(&state, Team::Home, 10).unwrap();
        let p5 = next.tactics.player("p5").unwrap();
        assert_eq!((p5.stamina, p5.fatigue), (100, 20));
        assert!(recover_stamina(&state, Team::Away, 10).is_none());
    }
}
