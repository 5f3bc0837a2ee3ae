use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::session::domain::loop_error::LoopError;
use crate::session::domain::run_state::RunState;
use crate::session::domain::tick_scheduler::{TickId, TickScheduler};

#[derive(Debug)]
struct LoopStatus {
    state: RunState,
    /// Bumped every time the loop enters `Running`; a tick only publishes
    /// if the epoch it started under is still current.
    epoch: u64,
    pending: Option<TickId>,
}

/// What a fired tick is allowed to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Admission {
    /// Not the tick the loop is waiting on (cancelled or already handled).
    Stale,
    /// The tick was pending but the loop is no longer running.
    Halted,
    Admitted(u64),
}

/// Shared run status of a landmark loop.
///
/// Cloneable and `Send + Sync`, so a subscriber, a detector or another
/// thread can observe the state or stop the loop, including while a
/// detection pass is in flight. Stopping is applied as a state change; the
/// in-flight pass finishes, then finds its epoch stale and drops its result.
#[derive(Clone)]
pub struct LoopControl {
    status: Arc<Mutex<LoopStatus>>,
    scheduler: Arc<dyn TickScheduler>,
}

impl LoopControl {
    pub(crate) fn new(scheduler: Arc<dyn TickScheduler>) -> Self {
        Self {
            status: Arc::new(Mutex::new(LoopStatus {
                state: RunState::Idle,
                epoch: 0,
                pending: None,
            })),
            scheduler,
        }
    }

    pub fn state(&self) -> RunState {
        self.lock().state
    }

    /// Moves a running loop to `Stopped` and cancels its pending tick.
    /// Returns true if the loop was running.
    pub fn stop(&self) -> bool {
        let mut status = self.lock();
        self.cancel_pending(&mut status);
        if status.state == RunState::Running {
            status.state = RunState::Stopped;
            true
        } else {
            false
        }
    }

    /// Enters `Initializing`, returning the state to restore on failure.
    pub(crate) fn begin_initializing(&self) -> Result<RunState, LoopError> {
        let mut status = self.lock();
        match status.state {
            RunState::Initializing => Err(LoopError::AlreadyInitializing),
            state if state.accepts_initialize() => {
                status.state = RunState::Initializing;
                Ok(state)
            }
            state => Err(LoopError::AlreadyInitialized(state)),
        }
    }

    /// Restores the state recorded by `begin_initializing` after a failure.
    pub(crate) fn abort_initializing(&self, previous: RunState) {
        let mut status = self.lock();
        if status.state == RunState::Initializing {
            status.state = previous;
        }
    }

    /// Enters `Running` under a fresh epoch and schedules the first tick.
    /// Returns false if it was already running.
    pub(crate) fn start_running(&self) -> bool {
        let mut status = self.lock();
        if status.state == RunState::Running {
            return false;
        }
        status.state = RunState::Running;
        status.epoch += 1;
        self.cancel_pending(&mut status);
        status.pending = Some(self.scheduler.schedule());
        true
    }

    /// Cancels any pending tick and moves to a terminal state.
    pub(crate) fn halt(&self, state: RunState) {
        let mut status = self.lock();
        self.cancel_pending(&mut status);
        status.state = state;
    }

    pub(crate) fn admit(&self, tick: TickId) -> Admission {
        let mut status = self.lock();
        if status.pending != Some(tick) {
            return Admission::Stale;
        }
        status.pending = None;
        if status.state == RunState::Running {
            Admission::Admitted(status.epoch)
        } else {
            Admission::Halted
        }
    }

    pub(crate) fn is_current(&self, epoch: u64) -> bool {
        let status = self.lock();
        status.state == RunState::Running && status.epoch == epoch
    }

    /// Schedules the next tick if `epoch` is still the running one.
    pub(crate) fn reschedule(&self, epoch: u64) -> bool {
        let mut status = self.lock();
        if status.state != RunState::Running || status.epoch != epoch || status.pending.is_some()
        {
            return false;
        }
        status.pending = Some(self.scheduler.schedule());
        true
    }

    pub(crate) fn pending(&self) -> Option<TickId> {
        self.lock().pending
    }

    fn cancel_pending(&self, status: &mut LoopStatus) {
        if let Some(tick) = status.pending.take() {
            self.scheduler.cancel(tick);
        }
    }

    fn lock(&self) -> MutexGuard<'_, LoopStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::infrastructure::manual_tick_scheduler::ManualTickScheduler;

    fn control() -> (LoopControl, Arc<ManualTickScheduler>) {
        let scheduler = Arc::new(ManualTickScheduler::new());
        (LoopControl::new(scheduler.clone()), scheduler)
    }

    #[test]
    fn test_starts_idle_without_pending_tick() {
        let (control, scheduler) = control();
        assert_eq!(control.state(), RunState::Idle);
        assert!(control.pending().is_none());
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_start_running_schedules_once() {
        let (control, scheduler) = control();
        assert!(control.start_running());
        assert!(!control.start_running());
        assert_eq!(control.state(), RunState::Running);
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn test_stop_cancels_pending_tick() {
        let (control, scheduler) = control();
        control.start_running();

        assert!(control.stop());
        assert!(!control.stop());
        assert_eq!(control.state(), RunState::Stopped);
        assert_eq!(scheduler.pending_count(), 0);
        assert!(control.pending().is_none());
    }

    #[test]
    fn test_stop_leaves_idle_untouched() {
        let (control, _) = control();
        assert!(!control.stop());
        assert_eq!(control.state(), RunState::Idle);
    }

    #[test]
    fn test_admit_only_pending_tick() {
        let (control, scheduler) = control();
        control.start_running();
        let tick = scheduler.take_due()[0];

        assert_eq!(control.admit(TickId::new(tick.value() + 7)), Admission::Stale);
        assert!(matches!(control.admit(tick), Admission::Admitted(_)));
        assert_eq!(control.admit(tick), Admission::Stale);
    }

    #[test]
    fn test_restart_invalidates_old_epoch() {
        let (control, scheduler) = control();
        control.start_running();
        let tick = scheduler.take_due()[0];
        let Admission::Admitted(epoch) = control.admit(tick) else {
            panic!("tick should be admitted");
        };

        control.stop();
        assert!(!control.is_current(epoch));
        control.start_running();
        assert!(!control.is_current(epoch));
        assert!(!control.reschedule(epoch));
    }

    #[test]
    fn test_reschedule_current_epoch() {
        let (control, scheduler) = control();
        control.start_running();
        let tick = scheduler.take_due()[0];
        let Admission::Admitted(epoch) = control.admit(tick) else {
            panic!("tick should be admitted");
        };

        assert!(control.reschedule(epoch));
        assert!(!control.reschedule(epoch));
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn test_begin_initializing_single_flight() {
        let (control, _) = control();
        assert_eq!(control.begin_initializing().unwrap(), RunState::Idle);
        assert!(matches!(
            control.begin_initializing(),
            Err(LoopError::AlreadyInitializing)
        ));
    }

    #[test]
    fn test_begin_initializing_rejects_initialized_loop() {
        let (control, _) = control();
        control.start_running();
        assert!(matches!(
            control.begin_initializing(),
            Err(LoopError::AlreadyInitialized(RunState::Running))
        ));
    }

    #[test]
    fn test_abort_initializing_restores_previous() {
        let (control, _) = control();
        control.halt(RunState::Disposed);
        let previous = control.begin_initializing().unwrap();
        control.abort_initializing(previous);
        assert_eq!(control.state(), RunState::Disposed);
    }

    #[test]
    fn test_clones_share_status() {
        let (control, _) = control();
        let remote = control.clone();
        control.start_running();
        assert_eq!(remote.state(), RunState::Running);
        remote.stop();
        assert_eq!(control.state(), RunState::Stopped);
    }
}
