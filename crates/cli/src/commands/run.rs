//! `serve` command implementation.

use anyhow::{Context, Result};
use contracts::RelayBlueprint;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `serve` command
pub async fn run_serve(args: &RunArgs) -> Result<()> {
    let blueprint = load_blueprint(args)?;

    info!(
        listen = %blueprint.server.listen,
        destination = %blueprint.destination.url,
        sink = ?blueprint.destination.kind,
        queue_capacity = blueprint.queue.capacity,
        overflow = ?blueprint.queue.overflow,
        max_in_flight = blueprint.dispatch.max_in_flight,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig { blueprint });

    info!("Starting relay...");

    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Relay execution failed")?;

    info!(
        received = stats.ingestion.events_received,
        delivered = stats.dispatch.metrics.delivered,
        failed = stats.dispatch.metrics.failed,
        duration_secs = stats.duration.as_secs_f64(),
        "Relay stopped"
    );
    stats.print_summary();

    Ok(())
}

/// Load the config file (or defaults), apply overrides and validate
fn load_blueprint(args: &RunArgs) -> Result<RelayBlueprint> {
    let mut blueprint = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            warn!("No configuration file given, using defaults");
            RelayBlueprint::default()
        }
    };

    apply_overrides(&mut blueprint, args);

    config_loader::ConfigLoader::validate(&blueprint)
        .map_err(|e| CliError::config_validation(e.to_string()))?;

    Ok(blueprint)
}

/// Apply command line / environment overrides on top of the blueprint
fn apply_overrides(blueprint: &mut RelayBlueprint, args: &RunArgs) {
    if let Some(ref listen) = args.listen {
        info!(listen = %listen, "Overriding listen address from CLI");
        blueprint.server.listen = listen.clone();
    }
    if let Some(ref url) = args.destination_url {
        info!(url = %url, "Overriding destination URL from CLI");
        blueprint.destination.url = url.clone();
    }
    if let Some(capacity) = args.queue_capacity {
        info!(capacity, "Overriding queue capacity from CLI");
        blueprint.queue.capacity = capacity;
    }
    if let Some(max_in_flight) = args.max_in_flight {
        info!(max_in_flight, "Overriding max in-flight deliveries from CLI");
        blueprint.dispatch.max_in_flight = max_in_flight;
    }
    if let Some(port) = args.metrics_port {
        info!(port, "Overriding metrics port from CLI");
        blueprint.observability.metrics_port = (port != 0).then_some(port);
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Received shutdown signal, stopping relay...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &RelayBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Server:");
    println!("  Listen: {}", blueprint.server.listen);
    match blueprint.server.max_body_bytes {
        Some(limit) => println!("  Max body: {} bytes", limit),
        None => println!("  Max body: unlimited"),
    }
    println!("\nQueue:");
    println!("  Capacity: {}", blueprint.queue.capacity);
    println!("  Overflow: {:?}", blueprint.queue.overflow);
    println!("\nDispatch:");
    println!("  Max in flight: {}", blueprint.dispatch.max_in_flight);
    println!("  Shutdown grace: {} ms", blueprint.dispatch.shutdown_grace_ms);
    println!("\nDestination:");
    println!(
        "  {} ({:?}) {}",
        blueprint.destination.name, blueprint.destination.kind, blueprint.destination.url
    );
    if let Some(timeout) = blueprint.destination.timeout_ms {
        println!("  Timeout: {} ms", timeout);
    }
    for name in blueprint.destination.headers.keys() {
        println!("  Header: {}", name);
    }
    println!("\nMapping:");
    println!("  Key policy: {:?}", blueprint.mapping.key_policy);
    match blueprint.observability.metrics_port {
        Some(port) => println!("\nMetrics: port {}", port),
        None => println!("\nMetrics: disabled"),
    }
    println!();
}
