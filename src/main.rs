//! break-a-client: a fault-injection TCP fixture
//!
//! Exposes listeners that deliberately misbehave so client software can be
//! exercised against pathological servers:
//! - Silent connections (close immediately, close after a pause, never respond)
//! - Canned and random responses
//! - Trickled and flooded responses
//! - Fake HTTP servers with fixed or randomly-picked failure codes
//!
//! Each requested behavior gets its own port, starting at the base port.
//! Configuration via CLI arguments or TOML file.

mod behavior;
mod behaviors;
mod config;
mod launcher;
mod registry;
mod response;
mod stream;

use config::Config;
use launcher::Launcher;
use registry::Registry;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let registry = Registry::builtin();
    let launcher = Launcher::new(config.base_port, &config.behaviors, &registry)?
        .with_host(&config.host)
        .with_behavior_options(config.behavior_options);

    info!(
        host = %config.host,
        base_port = config.base_port,
        behaviors = ?launcher.behavior_names(),
        "Starting break-a-client"
    );

    run(launcher)
}

/// Run the launcher until every listener stops; ctrl-c stops them all.
#[tokio::main]
async fn run(launcher: Launcher) -> Result<(), Box<dyn std::error::Error>> {
    let stop = launcher.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
            stop.cancel();
        }
    });

    launcher.start().await?;
    Ok(())
}
