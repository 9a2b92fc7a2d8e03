//! Device actuation: the privileged side of the service.
//!
//! This module owns the boundary between the service and the display
//! hardware:
//! - **[`DeviceActuator`]**: the capability that powers one display on or off
//! - **[`SystemctlActuator`]**: the production backend, starting a systemd user
//!   unit per action and display
//!
//! # Invocation contract
//!
//! 1. The caller passes a [`DisplayAction`] and a [`Device`]
//! 2. The actuator performs the toggle, bounded by its own timeout
//! 3. `Ok(())` means the toggle was accepted; any
//!    [`ActuatorError`](crate::error::ActuatorError) is a failure carrying
//!    the underlying diagnostic text
//!
//! Actuators never retry. Sequencing across several displays is the job of
//! [`DisplayController`](crate::displays::DisplayController).

pub mod systemctl;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ActuatorError;

pub use systemctl::SystemctlActuator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayAction {
    On,
    Off,
}

impl std::fmt::Display for DisplayAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayAction::On => write!(f, "on"),
            DisplayAction::Off => write!(f, "off"),
        }
    }
}

/// A display output, identified by its connector name (e.g. `HDMI-A-1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
}

impl Device {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

/// Powers a single display on or off.
#[async_trait]
pub trait DeviceActuator: Send + Sync {
    async fn invoke(&self, action: DisplayAction, device: &Device) -> Result<(), ActuatorError>;
}
