//! Playback timer abstraction
//!
//! The sequencer never sleeps; it asks a [`Scheduler`] to deliver an action
//! after a delay. [`TimerQueue`] is a cooperative, virtual-clock implementation
//! driven by the host loop (or by tests) through [`TimerQueue::pop_due`].

use std::collections::BTreeMap;
use std::time::Duration;

use crate::state::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

pub trait Scheduler {
    /// Deliver `action` once, `delay` from now.
    fn schedule(&mut self, delay: Duration, action: Action) -> TimerHandle;

    /// Cancel a pending timer. Returns `false` if it already fired or was cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

#[derive(Debug)]
struct Timer {
    due: Duration,
    action: Action,
}

/// Single-threaded timer queue on a virtual clock.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<TimerHandle, Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.values().map(|t| t.due).min()
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to it.
    /// Ties fire in scheduling order.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerHandle, Action)> {
        let (&handle, _) = self
            .pending
            .iter()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(h, t)| (t.due, **h))?;
        let timer = self.pending.remove(&handle)?;
        self.now = self.now.max(timer.due);
        Some((handle, timer.action))
    }

    /// Move the clock forward without firing anything.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&mut self, delay: Duration, action: Action) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        log::debug!("timer {:?} due in {:?}", handle, delay);
        self.pending.insert(handle, Timer { due: self.now + delay, action });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.pending.remove(&handle).is_some()
    }
}
