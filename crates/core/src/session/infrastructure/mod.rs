pub mod interval_tick_scheduler;
pub mod manual_tick_scheduler;
