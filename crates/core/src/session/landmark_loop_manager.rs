use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Instant;

use crate::capture::domain::frame_source::{FrameSource, FrameSourceFactory, SharedFrameSource};
use crate::detection::domain::landmark_detector::{DetectorFactory, LandmarkDetector};
use crate::detection::infrastructure::face_limit_detector::FaceLimitDetector;
use crate::session::domain::landmark_config::LandmarkConfig;
use crate::session::domain::landmark_events::{
    EventBus, LandmarkEvent, LandmarkEventKind, SubscriptionId,
};
use crate::session::domain::loop_error::LoopError;
use crate::session::domain::loop_stats::LoopStats;
use crate::session::domain::run_state::RunState;
use crate::session::domain::tick_scheduler::{TickId, TickScheduler};
use crate::session::loop_control::{Admission, LoopControl};
use crate::shared::face::Face;

/// A frame source tagged with who is responsible for stopping it.
pub enum FrameSourceHandle {
    /// Supplied by the caller; never stopped by the manager.
    Borrowed(SharedFrameSource),
    /// Created and started by the manager; stopped on dispose.
    Owned(SharedFrameSource),
}

impl FrameSourceHandle {
    pub fn source(&self) -> &SharedFrameSource {
        match self {
            FrameSourceHandle::Borrowed(source) | FrameSourceHandle::Owned(source) => source,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, FrameSourceHandle::Owned(_))
    }

    /// Drops the handle, stopping the source only if the manager owns it.
    fn release(self) {
        if let FrameSourceHandle::Owned(source) = self {
            lock_source(&source).stop();
            log::info!("Stopped owned frame source");
        }
    }
}

/// What a fired tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick was cancelled or already handled; nothing ran.
    Cancelled,
    /// The loop is not running; nothing ran and nothing was rescheduled.
    Halted,
    /// No decoded frame yet; detection skipped, next tick scheduled.
    NotReady,
    /// Detection succeeded with this many faces and was published.
    Detected(usize),
    /// Detection failed; the error was published, the result kept.
    Failed,
    /// The loop was stopped while detection ran; the result was dropped.
    Discarded,
}

/// Drives the acquire → detect → publish cycle over a frame source and a
/// landmark detector.
///
/// The manager never runs a tick on its own: the [`TickScheduler`] decides
/// when one is due and the host hands it back through [`fire`]. Ticks take
/// `&mut self`, so passes never overlap and a slow detector just lowers the
/// effective rate.
///
/// [`fire`]: LandmarkLoopManager::fire
pub struct LandmarkLoopManager {
    config: LandmarkConfig,
    detector_factory: Box<dyn DetectorFactory>,
    source_factory: Option<Box<dyn FrameSourceFactory>>,
    control: LoopControl,
    frame_source: Option<FrameSourceHandle>,
    detector: Option<Box<dyn LandmarkDetector>>,
    faces: Vec<Face>,
    events: EventBus,
    stats: LoopStats,
}

impl LandmarkLoopManager {
    pub fn new(
        config: LandmarkConfig,
        detector_factory: Box<dyn DetectorFactory>,
        scheduler: Arc<dyn TickScheduler>,
    ) -> Self {
        Self {
            config: config.normalized(),
            detector_factory,
            source_factory: None,
            control: LoopControl::new(scheduler),
            frame_source: None,
            detector: None,
            faces: Vec::new(),
            events: EventBus::new(),
            stats: LoopStats::new(),
        }
    }

    /// Lets `initialize(None)` create (and own) a frame source.
    pub fn with_frame_source_factory(mut self, factory: Box<dyn FrameSourceFactory>) -> Self {
        self.source_factory = Some(factory);
        self
    }

    /// Acquires a frame source and a detector, then starts the loop.
    ///
    /// A supplied `frame_source` must already be active and is never
    /// stopped by the manager. Without one, the configured factory creates
    /// a source which the manager starts and owns. On failure nothing is
    /// left running and the state returns to what it was.
    pub fn initialize(&mut self, frame_source: Option<SharedFrameSource>) -> Result<(), LoopError> {
        let previous = self.control.begin_initializing()?;

        let handle = match self.acquire_frame_source(frame_source) {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!("Landmark loop initialization failed: {e}");
                self.control.abort_initializing(previous);
                return Err(e);
            }
        };

        let detector = match self.acquire_detector() {
            Ok(detector) => detector,
            Err(e) => {
                log::warn!("Landmark loop initialization failed: {e}");
                handle.release();
                self.control.abort_initializing(previous);
                return Err(e);
            }
        };

        log::info!(
            "Landmark loop initialized (max_faces={}, refine_landmarks={}, mirror={}, owned source={})",
            self.config.max_faces,
            self.config.refine_landmarks,
            self.config.mirror,
            handle.is_owned()
        );
        self.frame_source = Some(handle);
        self.detector = Some(detector);
        self.faces.clear();
        self.stats = LoopStats::new();
        self.control.start_running();
        Ok(())
    }

    /// Resumes the loop. No-op if it is already running.
    pub fn start(&mut self) -> Result<(), LoopError> {
        if self.control.state() == RunState::Running {
            return Ok(());
        }
        if self.frame_source.is_none() || self.detector.is_none() {
            return Err(LoopError::NotInitialized);
        }
        if self.control.start_running() {
            log::info!("Landmark loop started");
        }
        Ok(())
    }

    /// Stops the loop and cancels the pending tick. Idempotent.
    pub fn stop(&mut self) {
        if self.control.stop() {
            log::info!("Landmark loop stopped");
        }
    }

    /// Stops the loop and releases the detector and the frame source
    /// (stopping the source only if owned). Only `initialize` is valid
    /// afterwards.
    pub fn dispose(&mut self) {
        self.stop();
        self.control.halt(RunState::Disposed);
        self.detector = None;
        if let Some(handle) = self.frame_source.take() {
            handle.release();
        }
        self.faces.clear();
        log::info!("Landmark loop disposed");
    }

    /// Runs the tick identified by `tick`, which the scheduler handed to
    /// the host.
    pub fn fire(&mut self, tick: TickId) -> TickOutcome {
        let epoch = match self.control.admit(tick) {
            Admission::Stale => return TickOutcome::Cancelled,
            Admission::Halted => return TickOutcome::Halted,
            Admission::Admitted(epoch) => epoch,
        };

        let started = Instant::now();
        let pass = match (&self.frame_source, &mut self.detector) {
            (Some(handle), Some(detector)) => {
                let source = lock_source(handle.source());
                if source.is_ready() {
                    source
                        .current_frame()
                        .map(|frame| detector.estimate_faces(frame))
                } else {
                    None
                }
            }
            _ => {
                log::debug!("Tick fired without frame source or detector; halting");
                return TickOutcome::Halted;
            }
        };
        self.stats.ticks += 1;

        let Some(pass) = pass else {
            self.stats.not_ready += 1;
            log::debug!("Frame source not ready; skipping detection");
            self.control.reschedule(epoch);
            return TickOutcome::NotReady;
        };
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        if !self.control.is_current(epoch) {
            self.stats.discarded += 1;
            log::debug!("Loop stopped during detection; discarding result");
            return TickOutcome::Discarded;
        }

        let outcome = match pass {
            Ok(faces) => {
                self.stats.record_detection(elapsed_ms, faces.len());
                log::debug!("Detected {} face(s) in {elapsed_ms:.1}ms", faces.len());
                self.faces = faces;
                self.events.emit(&LandmarkEvent::FaceDetected(&self.faces));
                TickOutcome::Detected(self.faces.len())
            }
            Err(e) => {
                self.stats.record_failure(elapsed_ms);
                log::warn!("Face detection error: {e}");
                self.events.emit(&LandmarkEvent::Error(e.as_ref()));
                TickOutcome::Failed
            }
        };

        self.control.reschedule(epoch);
        outcome
    }

    /// First face's keypoints as `[x, y, z]`, mirrored against the live
    /// frame width when `mirror` is on. Empty when no face is present.
    pub fn vertices(&self) -> Vec<[f64; 3]> {
        match self.faces.first() {
            Some(face) => face.vertices(self.mirror_width()),
            None => Vec::new(),
        }
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Latest published faces, unmirrored.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn mirror(&self) -> bool {
        self.config.mirror
    }

    pub fn config(&self) -> &LandmarkConfig {
        &self.config
    }

    pub fn frame_source(&self) -> Option<SharedFrameSource> {
        self.frame_source.as_ref().map(|h| h.source().clone())
    }

    pub fn owns_frame_source(&self) -> bool {
        self.frame_source.as_ref().is_some_and(|h| h.is_owned())
    }

    pub fn state(&self) -> RunState {
        self.control.state()
    }

    /// Shared handle for observing or stopping the loop from elsewhere.
    pub fn control(&self) -> LoopControl {
        self.control.clone()
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Subscribes to one event kind.
    pub fn on<F>(&mut self, kind: LandmarkEventKind, callback: F) -> SubscriptionId
    where
        F: FnMut(&LandmarkEvent<'_>) + Send + 'static,
    {
        self.events.subscribe(Some(kind), Box::new(callback))
    }

    /// Subscribes to every event kind.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&LandmarkEvent<'_>) + Send + 'static,
    {
        self.events.subscribe(None, Box::new(callback))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn acquire_frame_source(
        &self,
        frame_source: Option<SharedFrameSource>,
    ) -> Result<FrameSourceHandle, LoopError> {
        if let Some(source) = frame_source {
            let active = match source.lock() {
                Ok(guard) => guard.is_active(),
                Err(_) => return Err(LoopError::InvalidFrameSource("frame source lock poisoned")),
            };
            if !active {
                return Err(LoopError::InvalidFrameSource("frame source is not started"));
            }
            return Ok(FrameSourceHandle::Borrowed(source));
        }

        let factory = self
            .source_factory
            .as_ref()
            .ok_or(LoopError::NoFrameSourceFactory)?;
        let source = factory.create().map_err(LoopError::FrameSourceStart)?;
        lock_source(&source)
            .start()
            .map_err(LoopError::FrameSourceStart)?;
        Ok(FrameSourceHandle::Owned(source))
    }

    fn acquire_detector(&self) -> Result<Box<dyn LandmarkDetector>, LoopError> {
        let options = self.config.detector_options();
        let detector = self
            .detector_factory
            .create(&options)
            .map_err(LoopError::DetectorAcquisition)?;
        let limited = FaceLimitDetector::new(detector, options.max_faces)
            .map_err(|e| LoopError::DetectorAcquisition(e.into()))?;
        Ok(Box::new(limited))
    }

    fn mirror_width(&self) -> Option<f64> {
        if !self.config.mirror {
            return None;
        }
        let (width, _) = lock_source(self.frame_source.as_ref()?.source()).dimensions()?;
        (width > 0).then_some(width as f64)
    }
}

impl Drop for LandmarkLoopManager {
    fn drop(&mut self) {
        if self.frame_source.is_some() || self.detector.is_some() {
            self.dispose();
        }
    }
}

fn lock_source(source: &SharedFrameSource) -> MutexGuard<'_, dyn FrameSource + 'static> {
    source.lock().unwrap_or_else(PoisonError::into_inner)
}
