//! Session: state + side effects
//!
//! Owns the current [`RootState`], the snapshot store and the playback timer.
//! After every dispatch it reconciles the single animation timer with the
//! new state and autosaves when a persisted subtree changed.

use std::sync::Arc;
use std::time::Duration;

use super::action::Action;
use super::reducer::reduce;
use super::RootState;
use crate::config::TurfConfig;
use crate::models::AuthState;
use crate::playbook::{Scheduler, TimerHandle, TimerQueue};
use crate::save::{restore, SaveError, SaveManager, SnapshotStore};

pub struct Session<St: SnapshotStore, Sc: Scheduler> {
    state: RootState,
    config: TurfConfig,
    saves: SaveManager<St>,
    scheduler: Sc,
    animation_timer: Option<(TimerHandle, Action)>,
}

impl<St: SnapshotStore, Sc: Scheduler> Session<St, Sc> {
    /// Fresh session on the initial state. Storage is not read.
    pub fn new(config: TurfConfig, store: St, scheduler: Sc) -> Self {
        Self {
            state: RootState::initial(),
            config,
            saves: SaveManager::new(store),
            scheduler,
            animation_timer: None,
        }
    }

    /// Session resumed from the autosaved snapshot. A missing, stale or
    /// unreadable snapshot falls back to the initial state.
    pub fn init_from_storage(config: TurfConfig, store: St, scheduler: Sc) -> Self {
        let mut session = Self::new(config, store, scheduler);
        match session.saves.load_active() {
            Ok(Some(snapshot)) => {
                log::info!("Resuming from saved state");
                session.state = restore(&snapshot, &Arc::new(AuthState::default()));
            }
            Ok(None) => log::info!("No saved state, starting fresh"),
            Err(e) => log::warn!("Failed to load saved state, starting fresh: {}", e),
        }
        session
    }

    pub fn state(&self) -> &RootState {
        &self.state
    }

    pub fn config(&self) -> &TurfConfig {
        &self.config
    }

    pub fn saves(&self) -> &SaveManager<St> {
        &self.saves
    }

    pub fn scheduler(&self) -> &Sc {
        &self.scheduler
    }

    pub fn dispatch(&mut self, action: Action) -> Result<(), SaveError> {
        let next = reduce(&self.state, &action);
        if next.same_as(&self.state) {
            log::trace!("no-op {:?}", action);
            return Ok(());
        }
        let persisted_changed = !next.persisted_same_as(&self.state);
        self.state = next;
        self.reconcile_timer();

        if self.config.storage.autosave && persisted_changed && !self.state.ui.is_animating {
            self.saves.persist(&self.state)?;
        }
        Ok(())
    }

    /// Persist immediately, regardless of the autosave setting.
    pub fn save_now(&mut self) -> Result<(), SaveError> {
        self.saves.persist(&self.state)
    }

    pub fn load_slot(&mut self, slot_id: &str) -> Result<(), SaveError> {
        let snapshot = self.saves.load_slot(slot_id)?;
        self.dispatch(Action::LoadState { snapshot: Box::new(snapshot) })
    }

    /// The tick the current state is waiting for, if playing.
    fn desired_tick(&self) -> Option<Action> {
        let ui = &self.state.ui;
        if !ui.is_playing() {
            return None;
        }
        Some(Action::AnimationTick {
            item_id: ui.active_playbook_item_id.clone()?,
            from_step: ui.active_step_index?,
        })
    }

    /// Keep at most one pending tick, matching the play-head.
    fn reconcile_timer(&mut self) {
        let desired = self.desired_tick();
        if self.animation_timer.as_ref().map(|(_, a)| a) == desired.as_ref() {
            return;
        }
        if let Some((handle, _)) = self.animation_timer.take() {
            self.scheduler.cancel(handle);
        }
        if let Some(action) = desired {
            let handle = self.scheduler.schedule(self.config.step_interval(), action.clone());
            self.animation_timer = Some((handle, action));
        }
    }
}

impl<St: SnapshotStore> Session<St, TimerQueue> {
    /// Advance the virtual clock by `by`, dispatching every timer that falls
    /// due. Returns the number of timers fired.
    pub fn advance_clock(&mut self, by: Duration) -> Result<usize, SaveError> {
        let until = self.scheduler.now() + by;
        let mut fired = 0;
        while let Some((handle, action)) = self.scheduler.pop_due(until) {
            if self.animation_timer.as_ref().is_some_and(|(h, _)| *h == handle) {
                self.animation_timer = None;
            }
            self.dispatch(action)?;
            fired += 1;
        }
        self.scheduler.set_now(until);
        Ok(fired)
    }

    /// Fire timers until none are pending or `limit` have fired.
    pub fn run_until_idle(&mut self, limit: usize) -> Result<usize, SaveError> {
        let mut fired = 0;
        while fired < limit {
            let Some(deadline) = self.scheduler.next_deadline() else {
                break;
            };
            let by = deadline.saturating_sub(self.scheduler.now());
            fired += self.advance_clock(by)?;
        }
        Ok(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PitchPos;
    use crate::models::{PlayCategory, PositioningMode, Theme};
    use crate::save::{MemoryStore, SaveManager, ACTIVE_STATE_KEY};
    use proptest::prelude::*;

    fn session() -> Session<MemoryStore, TimerQueue> {
        Session::new(TurfConfig::default(), MemoryStore::new(), TimerQueue::new())
    }

    fn play_with_steps(session: &mut Session<MemoryStore, TimerQueue>, steps: usize) {
        session
            .dispatch(Action::CreatePlaybookItem {
                id: "play".into(),
                step_id: "st0".into(),
                name: "Switch".into(),
                category: PlayCategory::General,
            })
            .unwrap();
        session.dispatch(Action::SetPositioningMode { mode: PositioningMode::Free }).unwrap();
        for i in 1..steps {
            session.dispatch(Action::AddPlaybookStep { step_id: format!("st{}", i) }).unwrap();
            session
                .dispatch(Action::UpdatePlayerPosition {
                    player_id: "p8".into(),
                    position: PitchPos::new(50.0 + i as f64 * 5.0, 40.0),
                })
                .unwrap();
        }
    }

    #[test]
    fn test_animation_terminates() {
        let mut session = session();
        play_with_steps(&mut session, 3);
        session.dispatch(Action::StartAnimation).unwrap();
        assert_eq!(session.scheduler().pending_len(), 1);

        let interval = session.config().step_interval();
        assert_eq!(session.advance_clock(interval).unwrap(), 1);
        assert_eq!(session.state().ui.active_step_index, Some(1));
        assert_eq!(session.advance_clock(interval).unwrap(), 1);
        assert_eq!(session.advance_clock(interval).unwrap(), 1);

        assert!(!session.state().ui.is_animating);
        assert_eq!(session.scheduler().pending_len(), 0);
        assert_eq!(session.advance_clock(interval * 10).unwrap(), 0);
    }

    #[test]
    fn test_pause_cancels_timer() {
        let mut session = session();
        play_with_steps(&mut session, 3);
        session.dispatch(Action::StartAnimation).unwrap();
        session.dispatch(Action::PauseAnimation).unwrap();
        assert_eq!(session.scheduler().pending_len(), 0);
        assert_eq!(session.advance_clock(Duration::from_secs(60)).unwrap(), 0);

        session.dispatch(Action::ResumeAnimation).unwrap();
        assert_eq!(session.scheduler().pending_len(), 1);
        session.dispatch(Action::ResetAnimation).unwrap();
        assert_eq!(session.scheduler().pending_len(), 0);
    }

    #[test]
    fn test_autosave_skips_playback_frames() {
        let mut session = session();
        play_with_steps(&mut session, 2);
        let before = session.saves().store().read(ACTIVE_STATE_KEY).unwrap();
        assert!(before.is_some());

        session.dispatch(Action::StartAnimation).unwrap();
        session.advance_clock(session.config().step_interval()).unwrap();
        assert!(session.state().ui.is_animating);
        assert_eq!(session.saves().store().read(ACTIVE_STATE_KEY).unwrap(), before);
    }

    #[test]
    fn test_resume_from_storage() {
        let mut first = session();
        first.dispatch(Action::ToggleTheme).unwrap();
        let store = first.saves().store().clone();

        let resumed = Session::init_from_storage(TurfConfig::default(), store, TimerQueue::new());
        assert_eq!(resumed.state().ui.theme, Theme::Light);
    }

    #[test]
    fn test_stale_storage_starts_fresh() {
        let mut old = SaveManager::with_version(MemoryStore::new(), "7.0.0");
        let mut state = RootState::initial();
        Arc::make_mut(&mut state.ui).theme = Theme::Light;
        old.persist(&state).unwrap();

        let session = Session::init_from_storage(TurfConfig::default(), old.store().clone(), TimerQueue::new());
        assert_eq!(*session.state(), RootState::initial());
    }

    #[test]
    fn test_autosave_disabled() {
        let mut config = TurfConfig::default();
        config.storage.autosave = false;
        let mut session = Session::new(config, MemoryStore::new(), TimerQueue::new());
        session.dispatch(Action::ToggleTheme).unwrap();
        assert!(session.saves().store().read(ACTIVE_STATE_KEY).unwrap().is_none());
        session.save_now().unwrap();
        assert!(session.saves().store().read(ACTIVE_STATE_KEY).unwrap().is_some());
    }

    proptest! {
        /// Property: playback of an N-step play ends after exactly N ticks,
        /// with no timer left behind.
        #[test]
        fn prop_playback_ends_after_n_ticks(steps in 1usize..6) {
            let mut session = session();
            play_with_steps(&mut session, steps);
            session.dispatch(Action::StartAnimation).unwrap();
            let fired = session.run_until_idle(100).unwrap();
            prop_assert_eq!(fired, steps);
            prop_assert!(!session.state().ui.is_animating);
            prop_assert_eq!(session.scheduler().pending_len(), 0);
        }
    }
}
