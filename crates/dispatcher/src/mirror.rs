//! Mirror task - replays one query on every mirror target
//!
//! Each mirror runs in its own task and owns its handle and cursor. A mirror
//! failure is logged and counted at the mirror boundary; a panic is caught by
//! the join loop. Neither ever leaves [`MirrorTask::run`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, instrument};

use contracts::{ContractError, Query, Row, RowCursor, SqlTarget};

use crate::metrics::MirrorMetrics;

/// What a successful mirror execution produced
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorReport {
    /// Rows read while draining
    pub rows: u64,
    /// Row contents, only when capture is enabled
    pub captured: Option<Vec<Row>>,
}

/// Final state of one mirror execution
#[derive(Debug, Clone)]
pub struct MirrorOutcome {
    /// Mirror target name
    pub target: String,
    /// Report on success, rendered error on failure
    pub result: Result<MirrorReport, String>,
    /// Time from exec start to completion or failure
    pub elapsed: Duration,
}

impl MirrorOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Composite detached unit of work for one fan-out call
pub(crate) struct MirrorTask<T> {
    mirrors: Vec<T>,
    query: Query,
    capture_rows: bool,
    metrics: Arc<MirrorMetrics>,
    outcomes: Option<mpsc::UnboundedSender<MirrorOutcome>>,
}

impl<T> MirrorTask<T>
where
    T: SqlTarget + Sync + 'static,
    T::Cursor: 'static,
{
    pub(crate) fn new(
        mirrors: Vec<T>,
        query: Query,
        capture_rows: bool,
        metrics: Arc<MirrorMetrics>,
        outcomes: Option<mpsc::UnboundedSender<MirrorOutcome>>,
    ) -> Self {
        Self {
            mirrors,
            query,
            capture_rows,
            metrics,
            outcomes,
        }
    }

    /// Run every mirror concurrently and wait for all of them
    ///
    /// Never short-circuits: one mirror failing or panicking does not cancel
    /// or delay its siblings.
    #[instrument(
        name = "mirror_task",
        skip(self),
        fields(mirrors = self.mirrors.len(), sql = %self.query.sql())
    )]
    pub(crate) async fn run(self) {
        let Self {
            mirrors,
            query,
            capture_rows,
            metrics,
            outcomes,
        } = self;

        let mut set = JoinSet::new();
        let mut names = HashMap::with_capacity(mirrors.len());

        for target in mirrors {
            let name = target.name().to_string();
            let handle = set.spawn(run_mirror(
                target,
                query.clone(),
                capture_rows,
                Arc::clone(&metrics),
                outcomes.clone(),
            ));
            names.insert(handle.id(), name);
        }

        while let Some(joined) = set.join_next().await {
            let Err(e) = joined else { continue };

            // Panicked or cancelled mirror; run_mirror itself never fails
            let target = names
                .get(&e.id())
                .cloned()
                .unwrap_or_else(|| "<unknown>".to_string());
            metrics.inc_failed();
            observability::record_mirror_result(&target, false);
            error!(mirror = %target, error = %e, "Mirror execution error");
            send_outcome(
                outcomes.as_ref(),
                MirrorOutcome {
                    target,
                    result: Err(e.to_string()),
                    elapsed: Duration::ZERO,
                },
            );
        }

        debug!("Mirror task finished");
    }
}

/// Execute and drain one mirror, absorbing any failure
#[instrument(
    name = "mirror_execute",
    skip_all,
    fields(mirror = %target.name())
)]
async fn run_mirror<T: SqlTarget>(
    target: T,
    query: Query,
    capture_rows: bool,
    metrics: Arc<MirrorMetrics>,
    outcomes: Option<mpsc::UnboundedSender<MirrorOutcome>>,
) {
    let started = Instant::now();
    let result = execute_and_drain(&target, &query, capture_rows).await;
    let elapsed = started.elapsed();
    let name = target.name().to_string();

    observability::record_mirror_latency_ms(elapsed.as_secs_f64() * 1000.0);

    let result = match result {
        Ok(report) => {
            metrics.inc_succeeded();
            metrics.add_rows_drained(report.rows);
            observability::record_mirror_result(&name, true);
            observability::record_mirror_rows(&name, report.rows);
            debug!(mirror = %name, rows = report.rows, "Mirror drained");
            Ok(report)
        }
        Err(e) => {
            metrics.inc_failed();
            observability::record_mirror_result(&name, false);
            error!(mirror = %name, error = %e, "Mirror execution error");
            Err(e.to_string())
        }
    };

    send_outcome(
        outcomes.as_ref(),
        MirrorOutcome {
            target: name,
            result,
            elapsed,
        },
    );
}

async fn execute_and_drain<T: SqlTarget>(
    target: &T,
    query: &Query,
    capture_rows: bool,
) -> Result<MirrorReport, ContractError> {
    let mut cursor = target.exec(query).await?;
    let mut rows = 0u64;
    let mut captured = capture_rows.then(Vec::new);

    while let Some(row) = cursor.next_row().await? {
        rows += 1;
        if let Some(buf) = captured.as_mut() {
            buf.push(row);
        }
    }

    Ok(MirrorReport { rows, captured })
}

fn send_outcome(outcomes: Option<&mpsc::UnboundedSender<MirrorOutcome>>, outcome: MirrorOutcome) {
    if let Some(tx) = outcomes {
        // Receiver gone means nobody is observing
        let _ = tx.send(outcome);
    }
}
