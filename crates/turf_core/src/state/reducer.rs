//! Root reducer
//!
//! `reduce(state, action)` is pure: no clock, no randomness, no I/O. Every
//! handler yields `Option<RootState>`; `None` keeps the input, so a rejected
//! or no-op action leaves every subtree pointer-identical.

use std::sync::Arc;

use super::action::Action;
use super::{RootState, TacticsState};
use crate::franchise;
use crate::models::{AiChannel, AuthState, ModalType, Player, UiState};
use crate::playbook::sequencer;
use crate::save::format::restore;
use crate::save::store::is_valid_key;
use crate::tactics::{slot_action, slots};

fn with_auth(state: &RootState, auth: AuthState) -> Option<RootState> {
    if *state.auth == auth {
        return None;
    }
    Some(RootState { auth: Arc::new(auth), ..state.clone() })
}

fn with_tactics(state: &RootState, tactics: Option<TacticsState>) -> Option<RootState> {
    Some(RootState { tactics: Arc::new(tactics?), ..state.clone() })
}

fn with_ui(state: &RootState, ui: Option<UiState>) -> Option<RootState> {
    Some(RootState { ui: Arc::new(ui?), ..state.clone() })
}

/// Apply `f` to a copy of the ui subtree; unchanged copies are discarded.
fn edit_ui(state: &RootState, f: impl FnOnce(&mut UiState)) -> Option<RootState> {
    let mut ui = (*state.ui).clone();
    f(&mut ui);
    if ui == *state.ui {
        return None;
    }
    with_ui(state, Some(ui))
}

fn add_player(t: &TacticsState, player: &Player) -> Option<TacticsState> {
    if t.player(&player.id).is_some() {
        return None;
    }
    let mut next = t.clone();
    Arc::make_mut(&mut next.players).push(player.clone());
    Some(next)
}

/// Profile edit. Position, side and loan status are owned by other
/// transitions and kept as they are.
fn update_player(t: &TacticsState, player: &Player) -> Option<TacticsState> {
    let index = t.player_index(&player.id)?;
    let current = &t.players[index];
    let updated = Player {
        position: current.position,
        team: current.team,
        loan: current.loan.clone(),
        ..player.clone()
    };
    if updated == *current {
        return None;
    }
    let mut next = t.clone();
    Arc::make_mut(&mut next.players)[index] = updated;
    Some(next)
}

fn add_drawing(t: &TacticsState, drawing: &crate::models::Drawing) -> Option<TacticsState> {
    if drawing.points.is_empty() || t.drawings.iter().any(|d| d.id == drawing.id) {
        return None;
    }
    let mut next = t.clone();
    Arc::make_mut(&mut next.drawings).push(drawing.clone());
    Some(next)
}

fn undo_drawing(t: &TacticsState) -> Option<TacticsState> {
    t.drawings.last()?;
    let mut next = t.clone();
    Arc::make_mut(&mut next.drawings).pop();
    Some(next)
}

fn clear_drawings(t: &TacticsState) -> Option<TacticsState> {
    if t.drawings.is_empty() {
        return None;
    }
    let mut next = t.clone();
    next.drawings = Arc::new(Vec::new());
    Some(next)
}

pub fn reduce(state: &RootState, action: &Action) -> RootState {
    let t = &*state.tactics;
    let mode = state.ui.positioning_mode;

    let next = match action {
        // ---- auth ----
        Action::LoginSuccess { user } | Action::SignupSuccess { user } => {
            with_auth(state, AuthState::signed_in(user.clone()))
        }
        Action::LoginFailure { error } | Action::SignupFailure { error } => {
            with_auth(state, AuthState::failed(error.clone()))
        }
        Action::Logout => with_auth(state, AuthState::default()),

        // ---- root ----
        Action::LoadState { snapshot } => Some(restore(snapshot, &state.auth)),
        Action::ResetState => Some(RootState { auth: state.auth.clone(), ..RootState::initial() }),

        // ---- roster / formation ----
        Action::AddPlayer { player } => with_tactics(state, add_player(t, player)),
        Action::UpdatePlayer { player } => with_tactics(state, update_player(t, player)),
        Action::SelectPlayer { player_id } => {
            if player_id.as_deref().is_some_and(|id| t.player(id).is_none()) {
                None
            } else {
                edit_ui(state, |ui| ui.selected_player_id = player_id.clone())
            }
        }
        Action::SetCaptain { player_id } => with_tactics(state, slots::set_captain(t, player_id)),
        Action::BenchPlayer { player_id } => with_tactics(state, slots::bench_player(t, player_id)),
        Action::BenchAllPlayers { team } => with_tactics(state, slots::bench_all(t, *team)),
        Action::AssignPlayerTeam { player_id, team } => {
            with_tactics(state, slots::assign_player_team(t, player_id, *team))
        }
        Action::SetActiveFormation { team, formation_id } => {
            with_tactics(state, slots::set_active_formation(t, *team, formation_id))
        }
        Action::ClearFormation => with_tactics(state, slots::clear_formation(t)),
        Action::AssignPlayerToSlot { slot_id, player_id, team } => {
            with_tactics(state, slots::assign_player_to_slot(t, mode, slot_id, player_id, *team))
        }
        Action::UpdatePlayerPosition { player_id, position } => {
            with_tactics(state, slots::update_player_position(t, mode, player_id, *position))
        }
        Action::SetTeamTactic { team, change } => with_tactics(state, slots::set_team_tactic(t, *team, *change)),
        Action::SaveCustomFormation { formation } => {
            with_tactics(state, slots::save_custom_formation(t, formation))
        }
        Action::DeleteCustomFormation { formation_id } => {
            with_tactics(state, slots::delete_custom_formation(t, formation_id))
        }
        Action::UpdateTacticalFamiliarity { formation_id, increase } => {
            with_tactics(state, slots::adjust_tactical_familiarity(t, formation_id, *increase))
        }
        Action::SetSetPieceTaker { team, set_piece, player_id } => with_tactics(
            state,
            slots::set_set_piece_taker(t, *team, *set_piece, player_id.as_deref()),
        ),

        // ---- ui ----
        Action::SetActiveTeamContext { view } => edit_ui(state, |ui| ui.active_team_context = *view),
        Action::OpenModal { modal } => edit_ui(state, |ui| ui.active_modal = Some(*modal)),
        Action::CloseModal => edit_ui(state, |ui| {
            if ui.active_modal == Some(ModalType::SlotActionMenu) {
                ui.slot_action_menu = None;
            }
            ui.active_modal = None;
        }),
        Action::SetEditingPlayer { player_id } => edit_ui(state, |ui| {
            ui.editing_player_id = player_id.clone();
            ui.active_modal = player_id.as_ref().map(|_| ModalType::EditPlayer);
        }),
        Action::SetPlayerToCompare { player_id } => edit_ui(state, |ui| {
            ui.player_to_compare_id = player_id.clone();
            ui.active_modal = player_id.as_ref().map(|_| ModalType::ComparePlayer);
        }),
        Action::OpenSlotActionMenu { menu } => with_ui(state, slot_action::open_menu(&state.ui, menu)),
        Action::CloseSlotActionMenu => with_ui(state, slot_action::close_menu(&state.ui)),
        Action::ResolveSlotAction { decision } => slot_action::resolve(state, *decision),
        Action::SwapPlayers { source_player_id, target_player_id } => {
            with_tactics(state, slots::swap_players(t, mode, source_player_id, target_player_id))
        }
        Action::ToggleGridVisibility => edit_ui(state, |ui| ui.is_grid_visible = !ui.is_grid_visible),
        Action::ToggleFormationStrengthVisibility => {
            edit_ui(state, |ui| ui.is_formation_strength_visible = !ui.is_formation_strength_visible)
        }
        Action::ToggleTheme => edit_ui(state, |ui| ui.theme = ui.theme.toggled()),
        Action::SetTeamKit { team, kit } => edit_ui(state, |ui| *ui.team_kits.get_mut(*team) = kit.clone()),
        Action::AddNotification { notification } => edit_ui(state, |ui| {
            if !ui.notifications.iter().any(|n| n.id == notification.id) {
                ui.notifications.push(notification.clone());
            }
        }),
        Action::RemoveNotification { id } => edit_ui(state, |ui| ui.notifications.retain(|n| n.id != *id)),
        Action::EnterPresentationMode => edit_ui(state, |ui| {
            ui.is_presentation_mode = true;
            ui.active_modal = None;
            ui.slot_action_menu = None;
        }),
        Action::ExitPresentationMode => edit_ui(state, |ui| ui.is_presentation_mode = false),
        Action::SetRosterSearchQuery { query } => edit_ui(state, |ui| ui.roster_search_query = query.clone()),
        Action::ToggleRosterRoleFilter { role } => edit_ui(state, |ui| {
            if !ui.roster_role_filters.remove(role) {
                ui.roster_role_filters.insert(*role);
            }
        }),
        Action::SetTutorial { tutorial } => edit_ui(state, |ui| ui.tutorial = *tutorial),

        // ---- drawing ----
        Action::SetDrawingTool { tool } => edit_ui(state, |ui| ui.drawing_tool = *tool),
        Action::SetDrawingColor { color } => edit_ui(state, |ui| ui.drawing_color = color.clone()),
        Action::SetPositioningMode { mode } => edit_ui(state, |ui| ui.positioning_mode = *mode),
        Action::AddDrawing { drawing } => with_tactics(state, add_drawing(t, drawing)),
        Action::UndoLastDrawing => with_tactics(state, undo_drawing(t)),
        Action::ClearDrawings => with_tactics(state, clear_drawings(t)),

        // ---- playbook ----
        Action::CreatePlaybookItem { id, step_id, name, category } => {
            sequencer::create_item(state, id, step_id, name, *category)
        }
        Action::LoadPlaybookItem { item_id } => sequencer::load_item(state, item_id),
        Action::DeletePlaybookItem { item_id } => sequencer::delete_item(state, item_id),
        Action::DuplicatePlaybookItem { item_id, new_id } => sequencer::duplicate_item(state, item_id, new_id),
        Action::AddLibraryPlayToPlaybook { library_id, new_id } => {
            sequencer::add_library_play(state, library_id, new_id)
        }
        Action::LoadPlaybook { items } => sequencer::load_playbook(state, items),
        Action::ClosePlaybook => sequencer::close_playbook(state),
        Action::TogglePlaybookCategory { category } => Some(sequencer::toggle_category(state, *category)),
        Action::SetActiveStep { index } => sequencer::set_active_step(state, *index),
        Action::AddPlaybookStep { step_id } => sequencer::add_step(state, step_id),
        Action::DeletePlaybookStep { index } => sequencer::delete_step(state, *index),
        Action::SetPlaybookEvent { step_index, event } => sequencer::set_event(state, *step_index, event.clone()),
        Action::SetPlayerRun { step_index, player_id, points } => {
            sequencer::set_player_run(state, *step_index, player_id, points)
        }
        Action::SetBallPath { step_index, points } => sequencer::set_ball_path(state, *step_index, points),
        Action::StartAnimation => sequencer::start_animation(state),
        Action::PauseAnimation => sequencer::pause_animation(state),
        Action::ResumeAnimation => sequencer::resume_animation(state),
        Action::ResetAnimation => sequencer::reset_animation(state),
        Action::AnimationTick { item_id, from_step } => sequencer::tick(state, item_id, *from_step),

        // ---- save slots ----
        Action::CreateSaveSlot { slot } => {
            if is_valid_key(&slot.id) {
                edit_ui(state, |ui| {
                    ui.save_slots.insert(slot.id.clone(), slot.clone());
                    ui.active_save_slot_id = Some(slot.id.clone());
                })
            } else {
                log::warn!("rejecting save slot id {:?}", slot.id);
                None
            }
        }
        Action::DeleteSaveSlot { slot_id } => edit_ui(state, |ui| {
            ui.save_slots.remove(slot_id);
            if ui.active_save_slot_id.as_deref() == Some(slot_id.as_str()) {
                ui.active_save_slot_id = None;
            }
        }),
        Action::SetActiveSaveSlot { slot_id } => {
            if slot_id.as_ref().is_some_and(|id| !state.ui.save_slots.contains_key(id)) {
                None
            } else {
                edit_ui(state, |ui| ui.active_save_slot_id = slot_id.clone())
            }
        }

        // ---- ai ----
        Action::AiRequestStarted { channel } => edit_ui(state, |ui| {
            ui.ai.pending.insert(*channel);
        }),
        Action::AiRequestSucceeded { channel, result } => edit_ui(state, |ui| {
            ui.ai.pending.remove(channel);
            if *channel == AiChannel::Chat {
                ui.ai.chat_history.push(result.clone());
            }
            ui.ai.results.insert(*channel, result.clone());
        }),
        Action::AiRequestFailed { channel, error } => {
            log::warn!("AI request on {:?} failed: {}", channel, error);
            edit_ui(state, |ui| {
                ui.ai.pending.remove(channel);
            })
        }

        // ---- franchise ----
        Action::AdvanceWeek => Some(franchise::advance_week(state)),
        Action::CreateMentoringGroup { team, group } => franchise::create_mentoring_group(state, *team, group),
        Action::DissolveMentoringGroup { team, mentor_id } => {
            franchise::dissolve_mentoring_group(state, *team, mentor_id)
        }
        Action::SetRelationship { player_a, player_b, relationship } => {
            franchise::set_relationship(state, player_a, player_b, *relationship)
        }
        Action::SellPlayer { player_id, fee } => franchise::sell_player(state, player_id, *fee),
        Action::SignPlayer { player, fee } => franchise::sign_player(state, player, *fee),
        Action::LoanPlayer { player_id, club } => franchise::loan_player(state, player_id, club),
        Action::RecallPlayer { player_id } => franchise::recall_player(state, player_id),
        Action::RecoverStamina { team, amount } => franchise::recover_stamina(state, *team, *amount),
        Action::ClearLoanRequest => edit_ui(state, |ui| ui.pending_loan_request = None),
        Action::RecordMatchResult { result } => Some(franchise::record_match_result(state, result)),
        Action::StartNegotiation { player_id } => franchise::start_negotiation(state, player_id),
        Action::EndNegotiation => franchise::end_negotiation(state),

        // ---- export ----
        Action::ExportLineupStart => edit_ui(state, |ui| ui.is_exporting_lineup = true),
        Action::ExportLineupFinish => edit_ui(state, |ui| ui.is_exporting_lineup = false),
    };

    next.unwrap_or_else(|| state.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{PitchPos, Team};
    use crate::models::{PlayCategory, PositioningMode, User, UserRole};
    use proptest::prelude::*;

    fn run(state: &RootState, actions: &[Action]) -> RootState {
        actions.iter().fold(state.clone(), |s, a| reduce(&s, a))
    }

    fn assert_exclusive(t: &TacticsState) {
        let mut seen = std::collections::BTreeSet::new();
        for f in t.formations.values() {
            for id in f.bound_players() {
                assert!(seen.insert(id.clone()), "{} bound twice", id);
            }
        }
    }

    #[test]
    fn test_rejected_action_keeps_identity() {
        let state = RootState::initial();
        for action in [
            Action::BenchPlayer { player_id: "ghost".into() },
            Action::SetActiveStep { index: 3 },
            Action::UndoLastDrawing,
            Action::UpdatePlayerPosition { player_id: "p1".into(), position: PitchPos::new(1.0, 1.0) },
            Action::SelectPlayer { player_id: Some("ghost".into()) },
            Action::AnimationTick { item_id: "x".into(), from_step: 0 },
        ] {
            let next = reduce(&state, &action);
            assert!(next.same_as(&state), "{:?} changed state", action);
        }
    }

    #[test]
    fn test_untouched_subtrees_stay_shared() {
        let state = RootState::initial();
        let next = reduce(&state, &Action::ToggleTheme);
        assert!(Arc::ptr_eq(&state.tactics, &next.tactics));
        assert!(Arc::ptr_eq(&state.franchise, &next.franchise));
        assert!(Arc::ptr_eq(&state.auth, &next.auth));
        assert!(!Arc::ptr_eq(&state.ui, &next.ui));

        let next = reduce(&state, &Action::BenchPlayer { player_id: "p5".into() });
        assert!(Arc::ptr_eq(&state.ui, &next.ui));
        assert!(Arc::ptr_eq(&state.tactics.players, &next.tactics.players));
        assert!(Arc::ptr_eq(&state.tactics.playbook, &next.tactics.playbook));
        assert!(!Arc::ptr_eq(&state.tactics.formations, &next.tactics.formations));
    }

    #[test]
    fn test_reduce_is_pure() {
        let state = RootState::initial();
        let actions = [
            Action::SetActiveFormation { team: Team::Home, formation_id: "3-5-2".into() },
            Action::SetPositioningMode { mode: PositioningMode::Free },
            Action::UpdatePlayerPosition { player_id: "p9".into(), position: PitchPos::new(70.0, 40.0) },
        ];
        assert_eq!(run(&state, &actions), run(&state, &actions));
        assert_eq!(state, RootState::initial());
    }

    #[test]
    fn test_reset_and_load_keep_auth() {
        let user = User { id: "u1".into(), email: "coach@club.test".into(), role: UserRole::Coach };
        let state = reduce(&RootState::initial(), &Action::LoginSuccess { user });
        let changed = reduce(&state, &Action::ToggleTheme);
        let reset = reduce(&changed, &Action::ResetState);
        assert!(reset.auth.is_authenticated);
        assert_eq!(*reset.ui, UiState::default());

        let logged_out = reduce(&reset, &Action::Logout);
        assert!(!logged_out.auth.is_authenticated);
    }

    #[test]
    fn test_editing_player_opens_modal() {
        let state = RootState::initial();
        let next = reduce(&state, &Action::SetEditingPlayer { player_id: Some("p3".into()) });
        assert_eq!(next.ui.active_modal, Some(ModalType::EditPlayer));
        let closed = reduce(&next, &Action::SetEditingPlayer { player_id: None });
        assert_eq!(closed.ui.active_modal, None);
    }

    #[test]
    fn test_update_player_keeps_position_and_team() {
        let state = RootState::initial();
        let mut edited = state.tactics.player("p3").unwrap().clone();
        edited.name = "Chris Wall".into();
        edited.position = PitchPos::new(1.0, 1.0);
        edited.team = Team::Away;
        let next = reduce(&state, &Action::UpdatePlayer { player: edited });
        let p3 = next.tactics.player("p3").unwrap();
        assert_eq!(p3.name, "Chris Wall");
        assert_eq!(p3.position, PitchPos::new(25.0, 60.0));
        assert_eq!(p3.team, Team::Home);
    }

    #[test]
    fn test_ai_channels() {
        let state = RootState::initial();
        let started = reduce(&state, &Action::AiRequestStarted { channel: AiChannel::Chat });
        assert!(started.ui.ai.is_loading(AiChannel::Chat));
        let done = reduce(
            &started,
            &Action::AiRequestSucceeded { channel: AiChannel::Chat, result: serde_json::json!({"text": "Press high"}) },
        );
        assert!(!done.ui.ai.is_loading(AiChannel::Chat));
        assert_eq!(done.ui.ai.chat_history.len(), 1);

        let failed = reduce(
            &reduce(&done, &Action::AiRequestStarted { channel: AiChannel::Insight }),
            &Action::AiRequestFailed { channel: AiChannel::Insight, error: "timeout".into() },
        );
        assert!(failed.ui.ai.pending.is_empty());
        assert!(!failed.ui.ai.results.contains_key(&AiChannel::Insight));
    }

    #[test]
    fn test_save_slot_lifecycle() {
        let state = RootState::initial();
        let Action::CreateSaveSlot { slot } = Action::create_save_slot("Derby").unwrap() else {
            unreachable!()
        };
        let next = reduce(&state, &Action::CreateSaveSlot { slot: slot.clone() });
        assert_eq!(next.ui.active_save_slot_id.as_deref(), Some(slot.id.as_str()));
        let unknown = reduce(&next, &Action::SetActiveSaveSlot { slot_id: Some("nope".into()) });
        assert!(unknown.same_as(&next));
        let deleted = reduce(&next, &Action::DeleteSaveSlot { slot_id: slot.id.clone() });
        assert!(deleted.ui.save_slots.is_empty());
        assert_eq!(deleted.ui.active_save_slot_id, None);

        for bad in ["../../escaped", "a/b", ""] {
            let mut escaped = slot.clone();
            escaped.id = bad.into();
            let rejected = reduce(&deleted, &Action::CreateSaveSlot { slot: escaped });
            assert!(rejected.same_as(&deleted));
        }
    }

    #[test]
    fn test_playbook_through_reducer() {
        let state = RootState::initial();
        let state = run(
            &state,
            &[
                Action::CreatePlaybookItem {
                    id: "play".into(),
                    step_id: "a".into(),
                    name: "Build-up".into(),
                    category: PlayCategory::General,
                },
                Action::AddPlaybookStep { step_id: "b".into() },
                Action::SetPositioningMode { mode: PositioningMode::Free },
                Action::UpdatePlayerPosition { player_id: "p4".into(), position: PitchPos::new(35.0, 40.0) },
                Action::StartAnimation,
            ],
        );
        assert!(state.ui.is_playing());
        assert_eq!(state.tactics.player("p4").unwrap().position, PitchPos::new(25.0, 40.0));
        let state = reduce(&state, &Action::AnimationTick { item_id: "play".into(), from_step: 0 });
        assert_eq!(state.tactics.player("p4").unwrap().position, PitchPos::new(35.0, 40.0));
        let state = reduce(&state, &Action::AnimationTick { item_id: "play".into(), from_step: 1 });
        assert!(!state.ui.is_animating);
    }

    #[test]
    fn test_loaned_player_stays_unbound() {
        let state = run(
            &RootState::initial(),
            &[
                Action::LoanPlayer { player_id: "p23".into(), club: "Rovers".into() },
                Action::SwapPlayers { source_player_id: "p23".into(), target_player_id: "p7".into() },
            ],
        );
        assert!(state.tactics.binding_of("p23").is_none());
        assert!(state.tactics.binding_of("p7").is_some());
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        let player = (1..=24u8).prop_map(|n| format!("p{}", n));
        let slot = (1..=11u8).prop_map(|n| format!("s{}", n));
        let team = prop_oneof![Just(Team::Home), Just(Team::Away)];
        let formation = prop_oneof![Just("4-4-2"), Just("4-3-3"), Just("3-5-2")].prop_map(String::from);
        prop_oneof![
            (slot.clone(), player.clone(), team.clone())
                .prop_map(|(slot_id, player_id, team)| Action::AssignPlayerToSlot { slot_id, player_id, team }),
            (player.clone(), player.clone()).prop_map(|(source_player_id, target_player_id)| {
                Action::SwapPlayers { source_player_id, target_player_id }
            }),
            player.clone().prop_map(|player_id| Action::BenchPlayer { player_id }),
            (team.clone(), formation).prop_map(|(team, formation_id)| Action::SetActiveFormation { team, formation_id }),
            (player.clone(), team).prop_map(|(player_id, team)| Action::AssignPlayerTeam { player_id, team }),
            player.clone().prop_map(|player_id| Action::LoanPlayer { player_id, club: "Rovers".into() }),
            player.prop_map(|player_id| Action::SellPlayer { player_id, fee: 0 }),
            Just(Action::AdvanceWeek),
            Just(Action::ClearFormation),
        ]
    }

    proptest! {
        /// Property: no player is ever bound to two slots, every bound
        /// player exists, and nobody out on loan holds a slot.
        #[test]
        fn prop_slot_exclusivity(actions in prop::collection::vec(arb_action(), 1..40)) {
            let mut state = RootState::initial();
            for action in &actions {
                state = reduce(&state, action);
                assert_exclusive(&state.tactics);
                for f in state.tactics.formations.values() {
                    for id in f.bound_players() {
                        let player = state.tactics.player(id);
                        prop_assert!(player.is_some());
                        prop_assert!(!player.is_some_and(|p| p.loan.is_loaned), "{} bound while loaned", id);
                    }
                }
            }
        }
    }
}
