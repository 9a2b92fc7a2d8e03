use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::actuator::{Device, DeviceActuator, DisplayAction};

/// Switches every configured display in a fixed order.
///
/// Displays sharing a video source have to be brought up source-first and
/// taken down sink-first, with a pause in between for signal negotiation:
/// - `On` walks `devices` front to back
/// - `Off` walks `devices` back to front
///
/// Whole sequences are serialized, so two requests never interleave their
/// device toggles.
pub struct DisplayController {
    actuator: Arc<dyn DeviceActuator>,
    devices: Vec<Device>,
    settle_interval: Duration,
    sequence: Mutex<()>,
}

impl DisplayController {
    pub fn new(
        actuator: Arc<dyn DeviceActuator>,
        devices: Vec<Device>,
        settle_interval: Duration,
    ) -> Self {
        Self {
            actuator,
            devices,
            settle_interval,
            sequence: Mutex::new(()),
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Invocation order for `action`.
    pub fn order(&self, action: DisplayAction) -> Vec<&Device> {
        match action {
            DisplayAction::On => self.devices.iter().collect(),
            DisplayAction::Off => self.devices.iter().rev().collect(),
        }
    }

    /// Apply `action` to every display. Returns true only if every toggle
    /// succeeded; a failure never stops the remaining toggles.
    pub async fn set_all(&self, action: DisplayAction) -> bool {
        let _guard = self.sequence.lock().await;

        let mut all_ok = true;
        for (i, device) in self.order(action).into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.settle_interval).await;
            }

            match self.actuator.invoke(action, device).await {
                Ok(()) => {
                    tracing::debug!(device = %device, action = %action, "Display switched");
                }
                Err(e) => {
                    tracing::error!(device = %device, action = %action, error = %e, "Display command failed");
                    all_ok = false;
                }
            }
        }

        tracing::info!(action = %action, success = all_ok, "All displays switched");
        all_ok
    }
}
