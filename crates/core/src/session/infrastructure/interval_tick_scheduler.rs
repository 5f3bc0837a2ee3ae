use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::session::domain::tick_scheduler::{TickId, TickScheduler};
use crate::session::infrastructure::manual_tick_scheduler::TickQueue;

/// Emulates a display refresh for hosts without a compositor.
///
/// A `crossbeam_channel::tick` pulse at `rate_hz` stands in for vsync; each
/// pulse releases at most one pending tick through [`next_tick`].
///
/// [`next_tick`]: IntervalTickScheduler::next_tick
pub struct IntervalTickScheduler {
    pulse: Receiver<Instant>,
    period: Duration,
    queue: Mutex<TickQueue>,
}

impl IntervalTickScheduler {
    pub fn new(rate_hz: u32) -> Result<Self, &'static str> {
        if rate_hz == 0 {
            return Err("rate_hz must be >= 1");
        }
        let period = Duration::from_nanos(1_000_000_000 / u64::from(rate_hz));
        Ok(Self {
            pulse: crossbeam_channel::tick(period),
            period,
            queue: Mutex::new(TickQueue::default()),
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Waits for the next pulse and returns the oldest pending tick.
    ///
    /// Returns `None` right away when nothing is scheduled (the loop is
    /// halted), or when no pulse arrives within `timeout`, or when the tick
    /// was cancelled while waiting.
    pub fn next_tick(&self, timeout: Duration) -> Option<TickId> {
        if self.lock().is_empty() {
            return None;
        }
        self.pulse.recv_timeout(timeout).ok()?;
        self.lock().pop()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TickQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TickScheduler for IntervalTickScheduler {
    fn schedule(&self) -> TickId {
        self.lock().push()
    }

    fn cancel(&self, tick: TickId) {
        self.lock().remove(tick);
    }
}
