use crate::shared::face::Face;
use crate::shared::frame::Frame;

/// Options a detector is constructed with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectorOptions {
    /// Upper bound on faces returned per frame.
    pub max_faces: usize,
    /// Request the higher-fidelity landmark subset (irises, lips).
    pub refine_landmarks: bool,
}

/// Domain interface for face landmark estimation.
///
/// Implementations may be stateful (e.g., smoothing across frames),
/// hence `&mut self`.
pub trait LandmarkDetector: Send {
    fn estimate_faces(&mut self, frame: &Frame) -> Result<Vec<Face>, Box<dyn std::error::Error>>;
}

/// Loads a detector (model weights, runtime session) for the given options.
pub trait DetectorFactory: Send {
    fn create(
        &self,
        options: &DetectorOptions,
    ) -> Result<Box<dyn LandmarkDetector>, Box<dyn std::error::Error>>;
}
