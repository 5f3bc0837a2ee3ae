pub mod face_limit_detector;
pub mod recorded_detector;
