use thiserror::Error;

use crate::session::domain::run_state::RunState;

#[derive(Error, Debug)]
pub enum LoopError {
    #[error("initialization already in progress")]
    AlreadyInitializing,
    #[error("loop is already initialized ({0}); dispose it before initializing again")]
    AlreadyInitialized(RunState),
    #[error("loop has no frame source or detector; call initialize first")]
    NotInitialized,
    #[error("frame source is not usable: {0}")]
    InvalidFrameSource(&'static str),
    #[error("no frame source supplied and no frame source factory configured")]
    NoFrameSourceFactory,
    #[error("failed to start frame source: {0}")]
    FrameSourceStart(#[source] Box<dyn std::error::Error>),
    #[error("failed to acquire landmark detector: {0}")]
    DetectorAcquisition(#[source] Box<dyn std::error::Error>),
}
