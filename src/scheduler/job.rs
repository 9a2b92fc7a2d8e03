use std::time::Duration;

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::scheduler::timer::TimerHandle;

/// Wall-clock format used for fire-at times in API responses.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The pending delayed turn-off.
#[derive(Debug)]
pub struct ScheduledJob {
    pub id: Uuid,
    pub fire_at: DateTime<Local>,
    timer: TimerHandle,
}

impl ScheduledJob {
    pub(crate) fn new(id: Uuid, fire_at: DateTime<Local>, timer: TimerHandle) -> Self {
        Self { id, fire_at, timer }
    }

    /// Revoke the timer. Safe to call more than once, and after firing.
    pub fn cancel(&self) {
        self.timer.cancel();
    }
}

pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Wall-clock time `delay` from now, or `None` if it cannot be represented.
pub fn fire_at_after(delay: Duration) -> Option<DateTime<Local>> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|delta| Local::now().checked_add_signed(delta))
}

/// Time left until `at`, zero if it already passed.
pub fn time_until(at: &DateTime<Local>) -> Duration {
    (*at - Local::now()).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_format_matches_api() {
        let at = Local.with_ymd_and_hms(2026, 3, 7, 21, 5, 9).unwrap();
        assert_eq!(format_timestamp(&at), "2026-03-07 21:05:09");
    }

    #[test]
    fn fire_at_after_rejects_unrepresentable_delays() {
        assert!(fire_at_after(Duration::from_secs(3600)).is_some());
        assert!(fire_at_after(Duration::from_secs(u64::MAX)).is_none());
        assert!(fire_at_after(Duration::MAX).is_none());
    }
}
