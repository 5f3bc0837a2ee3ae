pub mod landmark_config;
pub mod landmark_events;
pub mod loop_error;
pub mod loop_stats;
pub mod run_state;
pub mod tick_scheduler;
