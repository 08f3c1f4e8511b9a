//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::FanoutBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    namespace: String,
    targets: Vec<TargetInfo>,
    mirror_settings: MirrorInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fixtures: Vec<FixtureInfo>,
}

#[derive(Serialize)]
struct TargetInfo {
    name: String,
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    location_hint: Option<String>,
}

#[derive(Serialize)]
struct MirrorInfo {
    capture_rows: bool,
    supervised: bool,
}

#[derive(Serialize)]
struct FixtureInfo {
    sql: String,
    columns: Vec<String>,
    row_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    targets: Vec<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = super::load_blueprint(&args.config)?;

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

fn role(index: usize) -> &'static str {
    if index == 0 {
        "main"
    } else {
        "mirror"
    }
}

fn build_config_info(blueprint: &FanoutBlueprint) -> ConfigInfo {
    let targets = blueprint
        .targets
        .iter()
        .enumerate()
        .map(|(i, t)| TargetInfo {
            name: t.name.clone(),
            role: role(i),
            location_hint: t.location_hint.map(|h| h.to_string()),
        })
        .collect();

    let fixtures = blueprint
        .fixtures
        .iter()
        .map(|f| FixtureInfo {
            sql: f.sql.clone(),
            columns: f.columns.clone(),
            row_count: f.rows.len(),
            targets: f.targets.clone(),
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        namespace: blueprint.namespace.clone(),
        targets,
        mirror_settings: MirrorInfo {
            capture_rows: blueprint.mirror.capture_rows,
            supervised: blueprint.mirror.supervised,
        },
        fixtures,
    }
}

fn print_config_info(blueprint: &FanoutBlueprint) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Multistub Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📍 Namespace");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   └─ Name: {}", blueprint.namespace);

    println!("\n🎯 Targets ({})", blueprint.targets.len());
    for (i, target) in blueprint.targets.iter().enumerate() {
        let is_last = i == blueprint.targets.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        match target.location_hint {
            Some(hint) => println!("   {} {} [{}] @ {}", prefix, target.name, role(i), hint),
            None => println!("   {} {} [{}]", prefix, target.name, role(i)),
        }
    }

    println!("\n⚙️  Mirror Settings");
    println!("   ├─ Capture rows: {}", blueprint.mirror.capture_rows);
    println!("   └─ Supervised: {}", blueprint.mirror.supervised);

    if !blueprint.fixtures.is_empty() {
        println!("\n📦 Fixtures ({})", blueprint.fixtures.len());
        for (i, fixture) in blueprint.fixtures.iter().enumerate() {
            let is_last = i == blueprint.fixtures.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            let scope = if fixture.targets.is_empty() {
                "all targets".to_string()
            } else {
                fixture.targets.join(", ")
            };
            println!(
                "   {} {} ({} rows, {})",
                prefix,
                fixture.sql,
                fixture.rows.len(),
                scope
            );
        }
    }

    println!();
}
