//! Embassy async tasks
//!
//! The pulse path itself runs in the TIMER2 interrupt; these tasks only
//! feed it commands and report on it.

pub mod control;
pub mod heartbeat;
pub mod stats;

pub use control::{control_task, Outputs};
pub use heartbeat::heartbeat_task;
pub use stats::stats_task;
