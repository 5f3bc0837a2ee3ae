use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::landmark_detector::DetectorOptions;
use crate::shared::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_MAX_FACES};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Options for a landmark loop. Fixed once a manager is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LandmarkConfig {
    /// Caps how many faces the detector returns. 0 is treated as 1.
    pub max_faces: usize,
    pub refine_landmarks: bool,
    /// Flip returned x-coordinates to match a mirrored camera preview.
    pub mirror: bool,
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            max_faces: DEFAULT_MAX_FACES,
            refine_landmarks: false,
            mirror: true,
        }
    }
}

impl LandmarkConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Reads a JSON config; absent keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.normalized())
    }

    pub fn normalized(mut self) -> Self {
        if self.max_faces == 0 {
            self.max_faces = DEFAULT_MAX_FACES;
        }
        self
    }

    pub fn detector_options(&self) -> DetectorOptions {
        DetectorOptions {
            max_faces: self.max_faces.max(1),
            refine_landmarks: self.refine_landmarks,
        }
    }
}
