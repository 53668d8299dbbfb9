//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::RelayBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    endpoints: Vec<String>,
    listen: String,
    queue: QueueInfo,
    dispatch: DispatchInfo,
    destination: DestinationInfo,
    key_policy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics_port: Option<u16>,
}

#[derive(Serialize)]
struct QueueInfo {
    capacity: usize,
    overflow: String,
}

#[derive(Serialize)]
struct DispatchInfo {
    max_in_flight: usize,
    shutdown_grace_ms: u64,
}

#[derive(Serialize)]
struct DestinationInfo {
    name: String,
    kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    header_names: Vec<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.effective {
        let rendered = if args.json {
            config_loader::ConfigLoader::to_json(&blueprint)
        } else {
            config_loader::ConfigLoader::to_toml(&blueprint)
        }
        .context("Failed to render effective configuration")?;
        println!("{}", rendered);
        return Ok(());
    }

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn build_config_info(blueprint: &RelayBlueprint) -> ConfigInfo {
    let dest = &blueprint.destination;

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        endpoints: vec!["POST /webhook".to_string(), "GET /health".to_string()],
        listen: blueprint.server.listen.clone(),
        queue: QueueInfo {
            capacity: blueprint.queue.capacity,
            overflow: format!("{:?}", blueprint.queue.overflow),
        },
        dispatch: DispatchInfo {
            max_in_flight: blueprint.dispatch.max_in_flight,
            shutdown_grace_ms: blueprint.dispatch.shutdown_grace_ms,
        },
        destination: DestinationInfo {
            name: dest.name.clone(),
            kind: format!("{:?}", dest.kind),
            url: dest.url.clone(),
            timeout_ms: dest.timeout_ms,
            // values may carry credentials
            header_names: dest.headers.keys().cloned().collect(),
        },
        key_policy: format!("{:?}", blueprint.mapping.key_policy),
        metrics_port: blueprint.observability.metrics_port,
    }
}

fn print_config_info(blueprint: &RelayBlueprint) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Webhook Relay Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🌐 Server");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Listen: {}", blueprint.server.listen);
    match blueprint.server.max_body_bytes {
        Some(limit) => println!("   ├─ Max body: {} bytes", limit),
        None => println!("   ├─ Max body: unlimited"),
    }
    println!("   └─ Endpoints: POST /webhook, GET /health");

    println!("\n📥 Queue");
    println!("   ├─ Capacity: {}", blueprint.queue.capacity);
    println!("   └─ Overflow: {:?}", blueprint.queue.overflow);

    println!("\n⚙️  Dispatch");
    println!("   ├─ Max in flight: {}", blueprint.dispatch.max_in_flight);
    println!("   ├─ Shutdown grace: {} ms", blueprint.dispatch.shutdown_grace_ms);
    println!("   └─ Key policy: {:?}", blueprint.mapping.key_policy);

    let dest = &blueprint.destination;
    println!("\n📤 Destination");
    println!("   ├─ Name: {} ({:?})", dest.name, dest.kind);
    match dest.timeout_ms {
        Some(ms) => println!("   ├─ Timeout: {} ms", ms),
        None => println!("   ├─ Timeout: none"),
    }
    if !dest.headers.is_empty() {
        let names: Vec<_> = dest.headers.keys().map(String::as_str).collect();
        println!("   ├─ Headers: {}", names.join(", "));
    }
    if dest.url.is_empty() {
        println!("   └─ URL: -");
    } else {
        println!("   └─ URL: {}", dest.url);
    }

    println!("\n📈 Metrics");
    match blueprint.observability.metrics_port {
        Some(port) => println!("   └─ Prometheus port: {}", port),
        None => println!("   └─ Prometheus: disabled"),
    }

    println!();
}
