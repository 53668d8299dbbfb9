//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{KeyPolicy, OverflowPolicy, RelayBlueprint, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    listen: String,
    destination: String,
    queue_capacity: usize,
    max_in_flight: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    listen: blueprint.server.listen.clone(),
                    destination: match blueprint.destination.kind {
                        SinkType::Http => blueprint.destination.url.clone(),
                        SinkType::Log => "(log)".to_string(),
                    },
                    queue_capacity: blueprint.queue.capacity,
                    max_in_flight: blueprint.dispatch.max_in_flight,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &RelayBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.destination.kind == SinkType::Log {
        warnings.push("destination.kind is \"log\" - events will not leave the process".to_string());
    }

    if blueprint.destination.timeout_ms.is_none() && blueprint.destination.kind == SinkType::Http {
        warnings.push(
            "destination.timeout_ms is not set - a stalled destination holds a delivery slot indefinitely"
                .to_string(),
        );
    }

    if blueprint.queue.overflow == OverflowPolicy::DropOldest {
        warnings.push("queue.overflow = drop_oldest - accepted events can be discarded".to_string());
    }

    if blueprint.mapping.key_policy == KeyPolicy::LastWriteWins {
        warnings.push(
            "mapping.key_policy = last_write_wins - empty triple keys produce an \"\" entry"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Listen: {}", summary.listen);
            println!("  Destination: {}", summary.destination);
            println!("  Queue capacity: {}", summary.queue_capacity);
            println!("  Max in flight: {}", summary.max_in_flight);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
