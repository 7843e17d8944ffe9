//! natmgrd daemon entry point.
//!
//! Binds the netsh driver to the adapter named by the NAT_ADAPTER
//! environment variable, resets the NAT subsystem, and reports the
//! live rule table.

use std::process::ExitCode;

use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use natmgrd::{NatConfig, NatDriver, NetshDriver};

/// Environment variable naming the adapter to manage.
const ADAPTER_ENV: &str = "NAT_ADAPTER";

/// Initialize tracing/logging.
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

async fn run() -> anyhow::Result<()> {
    let adapter = std::env::var(ADAPTER_ENV)
        .map_err(|_| anyhow::anyhow!("{} environment variable not set", ADAPTER_ENV))?;
    let config = NatConfig::new(adapter)?;

    let mut driver = NetshDriver::new();
    info!(driver = driver.name(), adapter = %config.adapter_name, "Initializing NAT driver");

    // Destructive: clears any pre-existing mapping state on the host.
    driver.init(&config).await?;

    let mappings = driver.list_port_mappings().await?;
    info!("Adapter bound for NAT with {} active mappings", mappings.len());
    for mapping in &mappings {
        info!(mapping = %mapping, "Active port mapping");
    }
    println!("{}", serde_json::to_string_pretty(&mappings)?);

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    info!("--- Starting natmgrd ---");

    match run().await {
        Ok(()) => {
            info!("natmgrd exiting normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("natmgrd error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
