use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::actuator::{Device, DeviceActuator, DisplayAction};
use crate::config::ActuatorConfig;
use crate::error::ActuatorError;

/// Switches displays by starting systemd user units.
///
/// Each toggle starts `<unit_prefix>-<action>@<device>`, e.g.
/// `wlr-display-off@HDMI-A-2`. When a `run_as` user is configured the
/// command goes through `su -l` so it reaches that user's systemd session:
///
/// ```text
/// su -l <user> -c "XDG_RUNTIME_DIR=<dir> systemctl --user start <unit>"
/// ```
///
/// Otherwise `systemctl --user start <unit>` runs directly with
/// `XDG_RUNTIME_DIR` set in its environment.
#[derive(Debug, Clone)]
pub struct SystemctlActuator {
    config: ActuatorConfig,
}

impl SystemctlActuator {
    pub fn new(config: ActuatorConfig) -> Self {
        Self { config }
    }

    pub fn unit_name(&self, action: DisplayAction, device: &Device) -> String {
        format!("{}-{}@{}", self.config.unit_prefix, action, device.id)
    }

    /// Build the command for one toggle without running it.
    pub fn command(&self, action: DisplayAction, device: &Device) -> Command {
        let unit = self.unit_name(action, device);
        let runtime_dir = self.config.runtime_dir.display().to_string();

        match self.config.run_as {
            Some(ref user) => {
                let mut cmd = Command::new("su");
                cmd.arg("-l").arg(user).arg("-c").arg(format!(
                    "XDG_RUNTIME_DIR={} systemctl --user start {}",
                    runtime_dir, unit
                ));
                cmd
            }
            None => {
                let mut cmd = Command::new("systemctl");
                cmd.args(["--user", "start"])
                    .arg(unit)
                    .env("XDG_RUNTIME_DIR", runtime_dir);
                cmd
            }
        }
    }
}

#[async_trait]
impl DeviceActuator for SystemctlActuator {
    async fn invoke(&self, action: DisplayAction, device: &Device) -> Result<(), ActuatorError> {
        tracing::info!(
            device = %device,
            action = %action,
            unit = %self.unit_name(action, device),
            "Switching display"
        );
        run_bounded(
            self.command(action, device),
            action,
            device,
            self.config.command_timeout,
        )
        .await
    }
}

/// Run `cmd` to completion within `timeout`.
///
/// The child is killed if the bound elapses. A non-zero exit is reported with
/// its stderr, or the exit status when stderr is empty.
pub async fn run_bounded(
    mut cmd: Command,
    action: DisplayAction,
    device: &Device,
    timeout: Duration,
) -> Result<(), ActuatorError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|source| ActuatorError::Launch {
        action,
        device: device.id.clone(),
        source,
    })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|source| ActuatorError::Launch {
            action,
            device: device.id.clone(),
            source,
        })?,
        Err(_) => {
            return Err(ActuatorError::Timeout {
                action,
                device: device.id.clone(),
                timeout,
            })
        }
    };

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let status = match output.status.code() {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    };

    Err(ActuatorError::Failed {
        action,
        device: device.id.clone(),
        diagnostic: if stderr.is_empty() {
            status.clone()
        } else {
            stderr
        },
        status,
    })
}
