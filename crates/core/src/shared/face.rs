use serde::{Deserialize, Serialize};

/// A single 3D landmark. Detectors that only produce 2D points leave `z` unset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, z: Option<f64>) -> Self {
        Self { x, y, z, name: None }
    }

    /// `[x, y, z]` with `z` defaulting to 0. When `mirror_width` is given,
    /// `x` is flipped horizontally to `width - x`.
    pub fn to_vertex(&self, mirror_width: Option<f64>) -> [f64; 3] {
        let x = match mirror_width {
            Some(width) => width - self.x,
            None => self.x,
        };
        [x, self.y, self.z.unwrap_or(0.0)]
    }
}

/// One detected face: its landmark mesh in detector output order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub keypoints: Vec<Keypoint>,
}

impl Face {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    pub fn vertices(&self, mirror_width: Option<f64>) -> Vec<[f64; 3]> {
        self.keypoints
            .iter()
            .map(|kp| kp.to_vertex(mirror_width))
            .collect()
    }
}
