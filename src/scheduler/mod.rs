pub mod job;
pub mod timer;
pub mod turn_off;

pub use job::{fire_at_after, format_timestamp, time_until, ScheduledJob, TIMESTAMP_FORMAT};
pub use timer::TimerHandle;
pub use turn_off::TurnOffScheduler;
