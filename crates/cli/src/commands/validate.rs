//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::FanoutBlueprint;
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
    namespace: String,
    main_target: String,
    mirror_count: usize,
    fixture_count: usize,
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

    match super::load_blueprint(&args.config) {
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
                    namespace: blueprint.namespace.clone(),
                    main_target: blueprint
                        .main_target()
                        .map(|t| t.name.clone())
                        .unwrap_or_default(),
                    mirror_count: blueprint.mirror_targets().len(),
                    fixture_count: blueprint.fixtures.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("{e:#}")),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &FanoutBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.mirror_targets().is_empty() {
        warnings.push("No mirror targets configured - queries only reach the main target".to_string());
    }

    if blueprint.fixtures.is_empty() {
        warnings.push("No fixtures configured - every query returns an empty result".to_string());
    }

    // Partially seeded fixtures make mirror results diverge from main
    for fixture in &blueprint.fixtures {
        let missing: Vec<&str> = blueprint
            .targets
            .iter()
            .filter(|t| !fixture.applies_to(&t.name))
            .map(|t| t.name.as_str())
            .collect();
        if !missing.is_empty() {
            warnings.push(format!(
                "Fixture '{}' is not seeded on: {}",
                fixture.sql,
                missing.join(", ")
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Namespace: {}", summary.namespace);
            println!("  Main target: {}", summary.main_target);
            println!("  Mirrors: {}", summary.mirror_count);
            println!("  Fixtures: {}", summary.fixture_count);
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
