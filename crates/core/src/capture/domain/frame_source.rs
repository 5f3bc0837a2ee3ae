use std::sync::{Arc, Mutex};

use crate::shared::frame::Frame;

/// A live provider of video frames (e.g. a camera).
///
/// Implementations own the capture device; the loop only asks whether a
/// decoded frame is available and borrows it for the duration of one
/// detection pass.
pub trait FrameSource: Send {
    /// Begins capture. May fail (device busy, permission denied, ...).
    fn start(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    /// Releases the capture device.
    fn stop(&mut self);

    /// True between a successful `start` and the next `stop`.
    fn is_active(&self) -> bool;

    /// Current pixel `(width, height)`, once known.
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// True once at least one frame has been decoded.
    fn is_ready(&self) -> bool {
        self.current_frame().is_some()
    }

    fn current_frame(&self) -> Option<&Frame>;
}

/// A frame source shared between its owner and the loop manager.
pub type SharedFrameSource = Arc<Mutex<dyn FrameSource>>;

/// Creates frame sources for managers that are not handed one.
pub trait FrameSourceFactory: Send {
    fn create(&self) -> Result<SharedFrameSource, Box<dyn std::error::Error>>;
}

/// Wraps a concrete source into the shared handle type.
pub fn share<S: FrameSource + 'static>(source: S) -> SharedFrameSource {
    Arc::new(Mutex::new(source))
}
