use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::actuator::Device;
use crate::error::{DisplayError, Result};
use crate::scheduler::fire_at_after;

/// Configuration for the systemd-backed device actuator.
#[derive(Debug, Clone)]
pub struct ActuatorConfig {
    /// Run the command as this user via `su -l` (for a service started as root)
    pub run_as: Option<String>,
    /// `XDG_RUNTIME_DIR` of the user owning the display session
    pub runtime_dir: PathBuf,
    /// Unit template prefix; units are named `<prefix>-<action>@<device>`
    pub unit_prefix: String,
    /// Upper bound for a single on/off command
    pub command_timeout: Duration,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            run_as: None,
            runtime_dir: PathBuf::from("/run/user/1000"),
            unit_prefix: "wlr-display".to_string(),
            command_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen_addr: SocketAddr,
    /// Displays in power-up order. Power-down walks the list in reverse.
    pub devices: Vec<Device>,
    /// Pause between two consecutive device toggles
    pub settle_interval: Duration,
    /// How long the timed-on endpoint keeps displays on
    pub on_duration: Duration,
    pub actuator: ActuatorConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 80)),
            devices: vec![Device::new("HDMI-A-1"), Device::new("HDMI-A-2")],
            settle_interval: Duration::from_millis(500),
            on_duration: Duration::from_secs(60 * 60),
            actuator: ActuatorConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            ..Default::default()
        }
    }

    pub fn with_devices(mut self, devices: Vec<Device>) -> Self {
        self.devices = devices;
        self
    }

    /// Check everything that ends up in a unit name or a shell command line.
    pub fn validate(&self) -> Result<()> {
        if self.devices.is_empty() {
            return Err(DisplayError::InvalidConfig(
                "at least one device is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for device in &self.devices {
            if !is_safe_token(&device.id) {
                return Err(DisplayError::InvalidConfig(format!(
                    "device id {:?} may only contain letters, digits, '-', '_' and '.'",
                    device.id
                )));
            }
            if !seen.insert(device.id.as_str()) {
                return Err(DisplayError::InvalidConfig(format!(
                    "device {} is listed more than once",
                    device.id
                )));
            }
        }

        if !is_safe_token(&self.actuator.unit_prefix) {
            return Err(DisplayError::InvalidConfig(format!(
                "unit prefix {:?} may only contain letters, digits, '-', '_' and '.'",
                self.actuator.unit_prefix
            )));
        }

        if let Some(ref user) = self.actuator.run_as {
            if !is_safe_token(user) {
                return Err(DisplayError::InvalidConfig(format!(
                    "run-as user {:?} is not a valid user name",
                    user
                )));
            }
        }

        if !is_safe_path(&self.actuator.runtime_dir) {
            return Err(DisplayError::InvalidConfig(format!(
                "runtime dir {:?} must be an absolute path of letters, digits, '-', '_', '.' and '/'",
                self.actuator.runtime_dir
            )));
        }

        if self.actuator.command_timeout.is_zero() {
            return Err(DisplayError::InvalidConfig(
                "command timeout must be greater than zero".to_string(),
            ));
        }

        if self.on_duration.is_zero() {
            return Err(DisplayError::InvalidConfig(
                "on duration must be greater than zero".to_string(),
            ));
        }

        if fire_at_after(self.on_duration).is_none() {
            return Err(DisplayError::InvalidConfig(format!(
                "on duration {:?} is too large to schedule",
                self.on_duration
            )));
        }

        Ok(())
    }
}

/// Parse a comma-separated device list, e.g. `"HDMI-A-1,HDMI-A-2"`.
/// Order is preserved; blank entries are skipped.
pub fn parse_devices(devices_str: &str) -> Vec<Device> {
    devices_str
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(Device::new)
        .collect()
}

/// Absolute path that can be interpolated into a shell line unquoted.
fn is_safe_path(path: &Path) -> bool {
    match path.to_str() {
        Some(s) => {
            path.is_absolute()
                && s.chars()
                    .all(|c| c == '/' || c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        }
        None => false,
    }
}

fn is_safe_token(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
