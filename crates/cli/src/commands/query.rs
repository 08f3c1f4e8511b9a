//! `query` command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{collect_rows, ExecutionContext, FanoutBlueprint, Query, Row, RowCursor, Value};
use dispatcher::{BackgroundTasks, DispatcherBuilder, DispatcherConfig, MirrorOutcome};
use memstore::MemoryNamespace;
use observability::FanoutStatsAggregator;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::QueryArgs;
use crate::error::CliError;

/// Query result for JSON output
#[derive(Serialize)]
struct QueryOutput {
    namespace: String,
    main: MainOutput,
    mirrors: Vec<MirrorOutput>,
    /// Mirrors abandoned when the wait ran out
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pending: Vec<String>,
}

#[derive(Serialize)]
struct MainOutput {
    target: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

#[derive(Serialize)]
struct MirrorOutput {
    target: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<u64>,
    /// Only known when mirror rows are captured
    #[serde(skip_serializing_if = "Option::is_none")]
    matches_main: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    elapsed_ms: f64,
}

/// Execute the `query` command
pub async fn run_query(args: &QueryArgs) -> Result<()> {
    info!(config = %args.config.display(), sql = %args.sql, "Running fan-out query");

    let blueprint = super::load_blueprint(&args.config)?;
    let query = build_query(&args.sql, &args.params)?;
    let wait = (args.mirror_timeout > 0).then(|| Duration::from_secs(args.mirror_timeout));

    let namespace = MemoryNamespace::from_blueprint(&blueprint);
    let (output, stats) = execute(&blueprint, namespace, query, !args.no_context, wait).await?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&output).context("Failed to serialize query result")?;
        println!("{}", json);
    } else {
        print_query_output(&output);
        if !output.mirrors.is_empty() {
            println!("{}", stats.summary());
        }
    }

    Ok(())
}

/// Parse CLI parameters into a query
fn build_query(sql: &str, raw_params: &[String]) -> Result<Query> {
    let params = raw_params
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            raw.parse::<Value>()
                .map_err(|e| CliError::invalid_param(i + 1, raw, e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Query::new(sql, params))
}

/// Fan `query` out over `namespace` using the targets of `blueprint`
///
/// Reads every main row, then waits (up to `wait`) for all mirrors to report.
/// Mirrors still running at the deadline are listed as pending; the main rows
/// are reported either way.
async fn execute(
    blueprint: &FanoutBlueprint,
    namespace: MemoryNamespace,
    query: Query,
    use_context: bool,
    wait: Option<Duration>,
) -> Result<(QueryOutput, FanoutStatsAggregator)> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let dispatcher =
        DispatcherBuilder::with_config(namespace, DispatcherConfig::from_blueprint(blueprint))
            .outcomes(tx)
            .build();

    let tasks = BackgroundTasks::new();
    let ctx: Option<&dyn ExecutionContext> = if use_context { Some(&tasks) } else { None };

    let mut cursor = dispatcher
        .query(ctx, &blueprint.targets, &query)
        .await
        .context("Fan-out query failed")?;
    let columns = cursor.column_names().to_vec();
    let rows = collect_rows(&mut cursor)
        .await
        .context("Failed to read main rows")?;

    // Mirror tasks hold the remaining senders; the channel closes after the last one
    drop(dispatcher);

    let expected = blueprint.mirror_targets().len();
    let mut outcomes: Vec<MirrorOutcome> = Vec::with_capacity(expected);
    let collect = async {
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }
    };
    let timed_out = match wait {
        Some(limit) => tokio::time::timeout(limit, collect).await.is_err(),
        None => {
            collect.await;
            false
        }
    };
    let pending: Vec<String> = if timed_out {
        tasks.abort_all();
        let pending: Vec<String> = blueprint
            .mirror_targets()
            .iter()
            .filter(|t| !outcomes.iter().any(|o| o.target == t.name))
            .map(|t| t.name.clone())
            .collect();
        warn!(pending = pending.len(), "Giving up on background mirrors");
        pending
    } else {
        tasks.wait_idle().await;
        Vec::new()
    };

    // Report mirrors in configured order
    outcomes.sort_by_key(|o| {
        blueprint
            .targets
            .iter()
            .position(|t| t.name == o.target)
            .unwrap_or(usize::MAX)
    });

    let mut stats = FanoutStatsAggregator::new();
    let mirrors = outcomes
        .into_iter()
        .map(|outcome| {
            let elapsed_ms = outcome.elapsed.as_secs_f64() * 1000.0;
            match outcome.result {
                Ok(report) => {
                    stats.record_success(report.rows, elapsed_ms);
                    MirrorOutput {
                        target: outcome.target,
                        success: true,
                        rows: Some(report.rows),
                        matches_main: report.captured.map(|captured| captured == rows),
                        error: None,
                        elapsed_ms,
                    }
                }
                Err(error) => {
                    stats.record_failure(&outcome.target, elapsed_ms);
                    MirrorOutput {
                        target: outcome.target,
                        success: false,
                        rows: None,
                        matches_main: None,
                        error: Some(error),
                        elapsed_ms,
                    }
                }
            }
        })
        .collect();

    let main_target = blueprint
        .main_target()
        .map(|t| t.name.clone())
        .unwrap_or_default();

    Ok((
        QueryOutput {
            namespace: blueprint.namespace.clone(),
            main: MainOutput {
                target: main_target,
                columns,
                rows,
            },
            mirrors,
            pending,
        },
        stats,
    ))
}

fn print_query_output(output: &QueryOutput) {
    println!("▶ {} / {}", output.namespace, output.main.target);

    if output.main.columns.is_empty() {
        println!("  (no result set)");
    } else {
        println!("  {}", output.main.columns.join(" | "));
        for row in &output.main.rows {
            let cells: Vec<String> = row.values().iter().map(|v| v.to_string()).collect();
            println!("  {}", cells.join(" | "));
        }
        println!("  ({} rows)", output.main.rows.len());
    }

    if !output.mirrors.is_empty() {
        println!("\n🪞 Mirrors ({})", output.mirrors.len());
        for (i, mirror) in output.mirrors.iter().enumerate() {
            let is_last = i == output.mirrors.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            match (&mirror.error, mirror.rows) {
                (Some(error), _) => println!("   {} {} ✗ {}", prefix, mirror.target, error),
                (None, rows) => {
                    let parity = match mirror.matches_main {
                        Some(true) => ", matches main",
                        Some(false) => ", DIFFERS from main",
                        None => "",
                    };
                    println!(
                        "   {} {} ✓ {} rows in {:.2}ms{}",
                        prefix,
                        mirror.target,
                        rows.unwrap_or_default(),
                        mirror.elapsed_ms,
                        parity
                    );
                }
            }
        }
    }

    if !output.pending.is_empty() {
        println!("\n⏳ Still running, not waited for: {}", output.pending.join(", "));
    }

    println!();
}
