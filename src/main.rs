use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use display_control::actuator::DisplayAction;
use display_control::config::{parse_devices, ActuatorConfig, ServiceConfig};
use display_control::service::DisplayService;
use display_control::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "display-control")]
#[command(version)]
#[command(about = "Switch attached displays on and off over HTTP")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the control page and HTTP API
    Serve(ServeArgs),

    /// Switch all displays on once and exit
    On(DisplayArgs),

    /// Switch all displays off once and exit
    Off(DisplayArgs),
}

// =============================================================================
// Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Port to listen on
    #[arg(long, default_value = "80")]
    port: u16,

    #[command(flatten)]
    display: DisplayArgs,
}

#[derive(Parser, Debug)]
struct DisplayArgs {
    /// Displays in power-up order (comma-separated); power-down is reversed
    #[arg(long, default_value = "HDMI-A-1,HDMI-A-2")]
    devices: String,

    /// Pause between two display toggles, in milliseconds
    #[arg(long, default_value = "500")]
    settle_ms: u64,

    /// How long the timed-on endpoint keeps displays on, in minutes
    #[arg(long, default_value = "60")]
    on_duration_mins: u64,

    /// Upper bound for a single display command, in seconds
    #[arg(long, default_value = "10")]
    command_timeout_secs: u64,

    /// Run display commands as this user (via `su -l`)
    #[arg(long)]
    run_as: Option<String>,

    /// XDG_RUNTIME_DIR of the user owning the display session
    #[arg(long, default_value = "/run/user/1000")]
    runtime_dir: PathBuf,

    /// systemd unit prefix; units are named <prefix>-<on|off>@<display>
    #[arg(long, default_value = "wlr-display")]
    unit_prefix: String,
}

impl DisplayArgs {
    fn into_config(self, listen_addr: SocketAddr) -> ServiceConfig {
        ServiceConfig {
            listen_addr,
            devices: parse_devices(&self.devices),
            settle_interval: Duration::from_millis(self.settle_ms),
            on_duration: Duration::from_secs(self.on_duration_mins.saturating_mul(60)),
            actuator: ActuatorConfig {
                run_as: self.run_as,
                runtime_dir: self.runtime_dir,
                unit_prefix: self.unit_prefix,
                command_timeout: Duration::from_secs(self.command_timeout_secs),
            },
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

async fn run_server(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args
        .display
        .into_config(SocketAddr::new(args.bind, args.port));
    config.validate()?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        devices = ?config.devices.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(),
        settle_ms = config.settle_interval.as_millis() as u64,
        on_duration_secs = config.on_duration.as_secs(),
        run_as = ?config.actuator.run_as,
        "Starting display control service"
    );

    let shutdown = install_shutdown_handler();
    let service = Arc::new(DisplayService::with_systemctl(&config));
    service.run(&config, shutdown).await?;

    Ok(())
}

async fn run_once(
    action: DisplayAction,
    args: DisplayArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.into_config(ServiceConfig::default().listen_addr);
    config.validate()?;

    let service = DisplayService::with_systemctl(&config);
    if service.displays().set_all(action).await {
        println!("Displays switched {}", action);
        Ok(())
    } else {
        Err(format!("failed to switch displays {}", action).into())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Serve(serve_args) => run_server(serve_args).await?,
        Commands::On(display_args) => run_once(DisplayAction::On, display_args).await?,
        Commands::Off(display_args) => run_once(DisplayAction::Off, display_args).await?,
    }

    Ok(())
}
