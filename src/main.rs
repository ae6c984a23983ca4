//! endpoint-kit demo server.
//!
//! Serves the Fibonacci routes through the full stack: request IDs,
//! tracing, admission limit, wrappers, and the JSON pipeline.
//!
//! ```text
//! endpoint-kit [--config <path>]
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use endpoint_kit::config::{load_config, ServiceConfig};
use endpoint_kit::lifecycle::{wait_for_signal, Shutdown};
use endpoint_kit::observability::{init_logging, metrics};
use endpoint_kit::{fibonacci, HttpServer};

#[derive(Parser)]
#[command(name = "endpoint-kit")]
#[command(about = "JSON endpoint server", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    init_logging(&config.observability);
    tracing::info!("endpoint-kit v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config = ?cli.config,
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, fibonacci::routes())?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
