use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::detection::domain::landmark_detector::{
    DetectorFactory, DetectorOptions, LandmarkDetector,
};
use crate::shared::face::Face;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("failed to read recording {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse recording {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("recording contains no detection steps")]
    Empty,
}

/// One recorded detection pass. `None` replays a detector failure.
pub type RecordedStep = Option<Vec<Face>>;

/// Replays recorded detection passes in order, wrapping around at the end.
///
/// Recordings are JSON arrays with one entry per pass: an array of faces
/// (`[{"keypoints": [{"x": .., "y": .., "z": ..}]}]`) or `null` for a pass
/// that failed. Lets the loop run end to end without a model runtime.
pub struct RecordedLandmarkDetector {
    steps: Arc<Vec<RecordedStep>>,
    cursor: usize,
}

impl RecordedLandmarkDetector {
    pub fn new(steps: Arc<Vec<RecordedStep>>) -> Result<Self, RecordingError> {
        if steps.is_empty() {
            return Err(RecordingError::Empty);
        }
        Ok(Self { steps, cursor: 0 })
    }

    pub fn load(path: &Path) -> Result<Self, RecordingError> {
        Self::new(Arc::new(read_steps(path)?))
    }
}

impl LandmarkDetector for RecordedLandmarkDetector {
    fn estimate_faces(&mut self, _frame: &Frame) -> Result<Vec<Face>, Box<dyn std::error::Error>> {
        let index = self.cursor % self.steps.len();
        self.cursor += 1;
        match &self.steps[index] {
            Some(faces) => Ok(faces.clone()),
            None => Err(format!("recorded detection failure at step {index}").into()),
        }
    }
}

/// Hands out replaying detectors that share one parsed recording.
pub struct RecordedDetectorFactory {
    steps: Arc<Vec<RecordedStep>>,
}

impl RecordedDetectorFactory {
    pub fn new(steps: Vec<RecordedStep>) -> Self {
        Self {
            steps: Arc::new(steps),
        }
    }

    pub fn load(path: &Path) -> Result<Self, RecordingError> {
        Ok(Self::new(read_steps(path)?))
    }
}

impl DetectorFactory for RecordedDetectorFactory {
    fn create(
        &self,
        options: &DetectorOptions,
    ) -> Result<Box<dyn LandmarkDetector>, Box<dyn std::error::Error>> {
        if options.refine_landmarks {
            log::debug!("Recorded detector replays landmarks as captured; refinement ignored");
        }
        Ok(Box::new(RecordedLandmarkDetector::new(self.steps.clone())?))
    }
}

fn read_steps(path: &Path) -> Result<Vec<RecordedStep>, RecordingError> {
    let json = fs::read_to_string(path).map_err(|source| RecordingError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| RecordingError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
