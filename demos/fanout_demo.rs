//! Fan-out Demo
//!
//! Runs one query against an in-memory namespace: the main replica answers,
//! one mirror is forced to fail and another is slowed down. The main rows are
//! printed immediately; the mirror summary once the background task is idle.
//!
//! Run with: cargo run -p fanout_demo [-- path/to/multistub.toml]

use std::path::Path;
use std::time::Duration;

use config_loader::ConfigLoader;
use contracts::{
    collect_rows, FanoutBlueprint, FixtureConfig, MirrorSettings, Query, Row, TargetConfig, Value,
};
use dispatcher::{BackgroundTasks, DispatcherBuilder, DispatcherConfig};
use memstore::{MemoryNamespace, ReplicaBehavior};

const SQL: &str = "SELECT id, name FROM users WHERE id=?";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init_tracing(observability::LogFormat::Compact, "debug")?;

    let blueprint = match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!(path = %path, "Loading blueprint config");
            ConfigLoader::load_from_path(Path::new(&path))?
        }
        None => default_blueprint(),
    };

    let namespace = MemoryNamespace::from_blueprint(&blueprint);
    let mirrors = blueprint.mirror_targets();
    if let Some(first) = mirrors.first() {
        namespace.replica(&first.name).set_behavior(ReplicaBehavior {
            fail_exec: Some("connection reset by peer".to_string()),
            ..Default::default()
        });
    }
    if let Some(second) = mirrors.get(1) {
        namespace.replica(&second.name).set_behavior(ReplicaBehavior {
            row_delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });
    }

    let dispatcher = DispatcherBuilder::with_config(
        namespace.clone(),
        DispatcherConfig::from_blueprint(&blueprint),
    )
    .build();
    let ctx = BackgroundTasks::new();

    let query = Query::new(SQL, vec![Value::Integer(7)]);
    let mut cursor = dispatcher
        .query(Some(&ctx), &blueprint.targets, &query)
        .await?;
    for row in collect_rows(&mut cursor).await? {
        println!("main row: {:?}", row.values());
    }

    tracing::info!(pending = ctx.pending(), "Main done, waiting for mirrors");
    ctx.wait_idle().await;

    let snapshot = dispatcher.metrics().snapshot();
    println!(
        "mirrors: launched={} succeeded={} failed={} rows={}",
        snapshot.launched, snapshot.succeeded, snapshot.failed, snapshot.rows_drained
    );
    for name in namespace.replica_names() {
        let replica = namespace.replica(&name);
        println!(
            "  {name}: executed={} completed={}",
            replica.exec_count(),
            replica.completed()
        );
    }

    Ok(())
}

fn default_blueprint() -> FanoutBlueprint {
    FanoutBlueprint {
        version: Default::default(),
        namespace: "users".to_string(),
        targets: vec![
            TargetConfig::new("primary"),
            TargetConfig::new("replica-east"),
            TargetConfig::new("replica-apac"),
        ],
        mirror: MirrorSettings::default(),
        fixtures: vec![FixtureConfig {
            sql: SQL.to_string(),
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![Row::new(vec![
                Value::Integer(7),
                Value::Text("ada".to_string()),
            ])],
            targets: Vec::new(),
        }],
    }
}
