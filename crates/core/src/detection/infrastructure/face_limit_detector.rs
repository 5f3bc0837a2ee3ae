use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::shared::face::Face;
use crate::shared::frame::Frame;

/// Decorator that caps how many faces reach the loop.
///
/// Faces are kept in detector order, so the primary face stays first.
pub struct FaceLimitDetector {
    inner: Box<dyn LandmarkDetector>,
    max_faces: usize,
}

impl FaceLimitDetector {
    pub fn new(inner: Box<dyn LandmarkDetector>, max_faces: usize) -> Result<Self, &'static str> {
        if max_faces < 1 {
            return Err("max_faces must be >= 1");
        }
        Ok(Self { inner, max_faces })
    }
}

impl LandmarkDetector for FaceLimitDetector {
    fn estimate_faces(&mut self, frame: &Frame) -> Result<Vec<Face>, Box<dyn std::error::Error>> {
        let mut faces = self.inner.estimate_faces(frame)?;
        if faces.len() > self.max_faces {
            log::debug!(
                "Detector returned {} faces, keeping {}",
                faces.len(),
                self.max_faces
            );
            faces.truncate(self.max_faces);
        }
        Ok(faces)
    }
}
