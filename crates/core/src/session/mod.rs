pub mod domain;
pub mod infrastructure;
pub mod landmark_loop_manager;
pub mod loop_control;
