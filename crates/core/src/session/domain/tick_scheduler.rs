/// Token for one scheduled loop iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(u64);

impl TickId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Schedules loop iterations against some refresh signal (a display's
/// vsync, a timer, or a test harness).
///
/// A scheduled tick is delivered back to the manager by the host calling
/// `LandmarkLoopManager::fire` with its id. Cancelled ids must never be
/// delivered; the manager additionally ignores any id it is not waiting on.
pub trait TickScheduler: Send + Sync {
    fn schedule(&self) -> TickId;

    fn cancel(&self, tick: TickId);
}
