use std::fmt;

/// Lifecycle state of a landmark loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunState {
    Idle,
    Initializing,
    Running,
    Stopped,
    Disposed,
}

impl RunState {
    /// States from which `initialize` may acquire fresh resources.
    pub fn accepts_initialize(self) -> bool {
        matches!(self, RunState::Idle | RunState::Disposed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Initializing => write!(f, "initializing"),
            RunState::Running => write!(f, "running"),
            RunState::Stopped => write!(f, "stopped"),
            RunState::Disposed => write!(f, "disposed"),
        }
    }
}
