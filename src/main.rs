//! Print queue host: config, logging, queue controller and web API.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use futures::StreamExt;
use print_queue::catalog::InMemoryPartCatalog;
use print_queue::config;
use print_queue::print_job::PrintJobManager;
use print_queue::query::{CapacityLevel, JobFilter};
use print_queue::web;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "print-queue-host", version, about = "Bounded print job queue host")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "print-queue.toml")]
    config: PathBuf,
    /// Listen address, overriding `server.bind`
    #[arg(long)]
    bind: Option<String>,
    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    tracing::info!("Starting print queue host");
    tracing::info!("Loading configuration from: {}", args.config.display());

    let config = config::load_config(&args.config).inspect_err(|_| {
        tracing::error!("Please ensure the configuration file exists and is properly formatted");
    })?;

    let catalog = Arc::new(InMemoryPartCatalog::new(config.catalog.parts.clone()));
    if catalog.is_empty() {
        tracing::warn!("Part catalog is empty; every new job will be rejected");
    }
    tracing::info!("Catalog: {} parts", catalog.len());
    tracing::info!(
        "Queue capacity: {} active jobs (warning at {:.0}%)",
        config.queue.capacity,
        config.queue.warn_ratio * 100.0
    );

    let manager = PrintJobManager::new(catalog.clone(), config.queue.clone());

    // Log whenever the queue crosses a capacity threshold.
    let mut updates = Box::pin(manager.live_view(JobFilter::all()).into_stream());
    tokio::spawn(async move {
        let mut last = CapacityLevel::Ok;
        while let Some(view) = updates.next().await {
            let capacity = view.capacity;
            if capacity.level == last {
                continue;
            }
            match capacity.level {
                CapacityLevel::Full => tracing::warn!(
                    "Maximum job limit reached ({}/{} active jobs)",
                    capacity.active,
                    capacity.limit
                ),
                CapacityLevel::Approaching => tracing::warn!(
                    "Approaching job limit: {}/{} active jobs",
                    capacity.active,
                    capacity.limit
                ),
                CapacityLevel::Ok => tracing::info!(
                    "Queue back under limit: {}/{} active jobs",
                    capacity.active,
                    capacity.limit
                ),
            }
            last = capacity.level;
        }
    });

    let app = web::api::create_router(manager, catalog);

    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!("Web API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Print queue host stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
