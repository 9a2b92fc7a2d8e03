use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::actuator::DisplayAction;
use crate::displays::DisplayController;
use crate::error::{DisplayError, Result};
use crate::scheduler::job::{fire_at_after, format_timestamp, time_until, ScheduledJob};
use crate::scheduler::timer;

/// Owns the single pending delayed turn-off.
///
/// The slot is either empty (idle) or holds one [`ScheduledJob`] (pending).
/// Every transition happens under the slot lock, so the fire-at time and the
/// timer handle are always observed together:
///
/// - [`schedule`](Self::schedule) retires any pending job and arms a new one
/// - [`cancel`](Self::cancel) retires the pending job, if any
/// - [`query`](Self::query) reads the fire-at time
///
/// When a timer elapses it first claims its job by taking it out of the slot.
/// A timer whose job was cancelled or superseded finds a different (or no)
/// job there and does nothing. After a successful claim the off-operation
/// runs to completion and a late `cancel` no longer affects it.
pub struct TurnOffScheduler {
    displays: Arc<DisplayController>,
    slot: Arc<Mutex<Option<ScheduledJob>>>,
}

impl TurnOffScheduler {
    pub fn new(displays: Arc<DisplayController>) -> Self {
        Self {
            displays,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Arm a turn-off `delay` from now, replacing any pending one.
    /// Returns the wall-clock fire-at time.
    pub async fn schedule(&self, delay: Duration) -> Result<DateTime<Local>> {
        let fire_at = fire_at_after(delay).ok_or(DisplayError::ScheduleOutOfRange(delay))?;

        let mut slot = self.slot.lock().await;

        if let Some(previous) = slot.take() {
            previous.cancel();
            tracing::info!(
                job_id = %previous.id,
                fire_at = %format_timestamp(&previous.fire_at),
                "Superseding scheduled turn-off"
            );
        }

        let id = Uuid::new_v4();
        let handle = timer::arm(delay, {
            let slot = self.slot.clone();
            let displays = self.displays.clone();
            move || Self::fire(id, slot, displays)
        });

        *slot = Some(ScheduledJob::new(id, fire_at, handle));

        tracing::info!(
            job_id = %id,
            fire_at = %format_timestamp(&fire_at),
            delay_secs = delay.as_secs(),
            "Scheduled display turn-off"
        );

        Ok(fire_at)
    }

    /// Retire the pending turn-off. Returns false when nothing was pending.
    pub async fn cancel(&self) -> bool {
        let previous = self.slot.lock().await.take();
        match previous {
            Some(job) => {
                job.cancel();
                tracing::info!(
                    job_id = %job.id,
                    fire_at = %format_timestamp(&job.fire_at),
                    "Cancelled scheduled turn-off"
                );
                true
            }
            None => false,
        }
    }

    /// Fire-at time of the pending turn-off, if any.
    pub async fn query(&self) -> Option<DateTime<Local>> {
        self.slot.lock().await.as_ref().map(|job| job.fire_at)
    }

    /// Fire-at time and time left of the pending turn-off, read together.
    /// The time left is zero once overdue.
    pub async fn pending(&self) -> Option<(DateTime<Local>, Duration)> {
        self.slot
            .lock()
            .await
            .as_ref()
            .map(|job| (job.fire_at, time_until(&job.fire_at)))
    }

    /// Drop the pending turn-off on process shutdown. Nothing is persisted.
    pub async fn shutdown(&self) {
        if let Some(job) = self.slot.lock().await.take() {
            job.cancel();
            tracing::warn!(
                job_id = %job.id,
                fire_at = %format_timestamp(&job.fire_at),
                "Discarding scheduled turn-off on shutdown"
            );
        }
    }

    async fn fire(
        id: Uuid,
        slot: Arc<Mutex<Option<ScheduledJob>>>,
        displays: Arc<DisplayController>,
    ) {
        let claimed = {
            let mut slot = slot.lock().await;
            if slot.as_ref().map(|job| job.id) == Some(id) {
                slot.take()
            } else {
                None
            }
        };

        let Some(job) = claimed else {
            tracing::debug!(job_id = %id, "Stale turn-off timer, job already retired");
            return;
        };

        tracing::info!(job_id = %job.id, "Scheduled turn-off firing");
        if !displays.set_all(DisplayAction::Off).await {
            tracing::warn!(job_id = %job.id, "Scheduled turn-off did not complete cleanly");
        }
    }
}
