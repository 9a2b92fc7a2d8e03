use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio_util::sync::CancellationToken;

use crate::actuator::{DeviceActuator, DisplayAction, SystemctlActuator};
use crate::api::{run_server, ApiState};
use crate::config::ServiceConfig;
use crate::displays::DisplayController;
use crate::error::{DisplayError, Result};
use crate::scheduler::TurnOffScheduler;

/// The operations behind the control API.
///
/// Composes the all-displays sequence with the delayed turn-off slot. Request
/// handlers only ever talk to this type.
pub struct DisplayService {
    displays: Arc<DisplayController>,
    scheduler: TurnOffScheduler,
    on_duration: Duration,
}

impl DisplayService {
    pub fn new(config: &ServiceConfig, actuator: Arc<dyn DeviceActuator>) -> Self {
        let displays = Arc::new(DisplayController::new(
            actuator,
            config.devices.clone(),
            config.settle_interval,
        ));

        Self {
            scheduler: TurnOffScheduler::new(displays.clone()),
            displays,
            on_duration: config.on_duration,
        }
    }

    /// Build a service driving real displays through systemd user units.
    pub fn with_systemctl(config: &ServiceConfig) -> Self {
        Self::new(
            config,
            Arc::new(SystemctlActuator::new(config.actuator.clone())),
        )
    }

    pub fn displays(&self) -> &DisplayController {
        &self.displays
    }

    pub fn scheduler(&self) -> &TurnOffScheduler {
        &self.scheduler
    }

    pub fn on_duration(&self) -> Duration {
        self.on_duration
    }

    /// Cancel any scheduled turn-off, then switch every display on.
    pub async fn turn_on(&self) -> bool {
        self.scheduler.cancel().await;
        self.displays.set_all(DisplayAction::On).await
    }

    /// Cancel any scheduled turn-off, then switch every display off.
    pub async fn turn_off(&self) -> bool {
        self.scheduler.cancel().await;
        self.displays.set_all(DisplayAction::Off).await
    }

    /// Switch every display on and schedule a turn-off `duration` later.
    ///
    /// Nothing is scheduled unless every display came on; an already pending
    /// turn-off is left as it was in that case.
    pub async fn turn_on_for(&self, duration: Duration) -> Result<DateTime<Local>> {
        if !self.displays.set_all(DisplayAction::On).await {
            return Err(DisplayError::ActivationFailed);
        }
        self.scheduler.schedule(duration).await
    }

    /// [`turn_on_for`](Self::turn_on_for) with the configured on-duration.
    pub async fn turn_on_timed(&self) -> Result<DateTime<Local>> {
        self.turn_on_for(self.on_duration).await
    }

    pub async fn scheduled_off(&self) -> Option<DateTime<Local>> {
        self.scheduler.query().await
    }

    /// Serve the control API on `config.listen_addr` until `shutdown` fires.
    ///
    /// A pending turn-off is discarded once the server has stopped.
    pub async fn run(
        self: Arc<Self>,
        config: &ServiceConfig,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let state = ApiState {
            service: self.clone(),
        };

        let served = run_server(config.listen_addr, state, shutdown).await;
        self.scheduler.shutdown().await;
        served
    }
}
