use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::session::domain::tick_scheduler::{TickId, TickScheduler};

/// Ordered set of scheduled, not yet delivered ticks.
#[derive(Debug, Default)]
pub(crate) struct TickQueue {
    next_id: u64,
    pending: VecDeque<TickId>,
}

impl TickQueue {
    pub(crate) fn push(&mut self) -> TickId {
        let id = TickId::new(self.next_id);
        self.next_id += 1;
        self.pending.push_back(id);
        id
    }

    pub(crate) fn remove(&mut self, tick: TickId) {
        self.pending.retain(|&t| t != tick);
    }

    pub(crate) fn pop(&mut self) -> Option<TickId> {
        self.pending.pop_front()
    }

    pub(crate) fn drain(&mut self) -> Vec<TickId> {
        self.pending.drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Scheduler whose ticks fire only when the host pumps them.
///
/// Suits hosts that already own a render loop (call [`take_due`] once per
/// rendered frame) and deterministic tests.
///
/// [`take_due`]: ManualTickScheduler::take_due
#[derive(Debug, Default)]
pub struct ManualTickScheduler {
    queue: Mutex<TickQueue>,
}

impl ManualTickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every pending tick, oldest first.
    pub fn take_due(&self) -> Vec<TickId> {
        self.lock().drain()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TickQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TickScheduler for ManualTickScheduler {
    fn schedule(&self) -> TickId {
        self.lock().push()
    }

    fn cancel(&self, tick: TickId) {
        self.lock().remove(tick);
    }
}
