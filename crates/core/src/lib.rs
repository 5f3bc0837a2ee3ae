//! Continuous face landmark detection loop.
//!
//! Composes a [`FrameSource`](capture::domain::frame_source::FrameSource)
//! and a [`LandmarkDetector`](detection::domain::landmark_detector::LandmarkDetector)
//! into a scheduled acquire → detect → publish cycle, managed by
//! [`LandmarkLoopManager`](session::landmark_loop_manager::LandmarkLoopManager).

pub mod capture;
pub mod detection;
pub mod session;
pub mod shared;
