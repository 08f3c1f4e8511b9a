//! Dispatcher - fan-out of one query to a main target and its mirrors

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, instrument};

use contracts::{
    BackgroundTask, ExecutionContext, FanoutBlueprint, MirrorSettings, Query, SqlTarget,
    TargetConfig, TargetResolver,
};

use crate::error::DispatcherError;
use crate::metrics::MirrorMetrics;
use crate::mirror::{MirrorOutcome, MirrorTask};

/// Cursor type produced by the targets of resolver `R`
pub type CursorOf<R> = <<R as TargetResolver>::Target as SqlTarget>::Cursor;

/// Dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Namespace handed to the resolver
    pub namespace: String,
    /// Mirror execution policy
    pub mirror: MirrorSettings,
}

impl DispatcherConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            mirror: MirrorSettings::default(),
        }
    }

    pub fn from_blueprint(blueprint: &FanoutBlueprint) -> Self {
        Self {
            namespace: blueprint.namespace.clone(),
            mirror: blueprint.mirror,
        }
    }
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder<R> {
    resolver: R,
    config: DispatcherConfig,
    metrics: Option<Arc<MirrorMetrics>>,
    outcomes: Option<mpsc::UnboundedSender<MirrorOutcome>>,
}

impl<R> DispatcherBuilder<R> {
    /// Create a builder with default mirror settings
    pub fn new(resolver: R, namespace: impl Into<String>) -> Self {
        Self::with_config(resolver, DispatcherConfig::new(namespace))
    }

    pub fn with_config(resolver: R, config: DispatcherConfig) -> Self {
        Self {
            resolver,
            config,
            metrics: None,
            outcomes: None,
        }
    }

    pub fn mirror_settings(mut self, settings: MirrorSettings) -> Self {
        self.config.mirror = settings;
        self
    }

    /// Share metrics with another dispatcher or the host
    pub fn metrics(mut self, metrics: Arc<MirrorMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Report every finished mirror execution on `tx`
    pub fn outcomes(mut self, tx: mpsc::UnboundedSender<MirrorOutcome>) -> Self {
        self.outcomes = Some(tx);
        self
    }

    pub fn build(self) -> Dispatcher<R> {
        Dispatcher {
            resolver: self.resolver,
            config: self.config,
            metrics: self.metrics.unwrap_or_default(),
            outcomes: self.outcomes,
        }
    }
}

/// Primary-plus-mirrors query dispatcher
///
/// Stateless between calls apart from its metrics; one dispatcher may serve
/// any number of concurrent queries.
pub struct Dispatcher<R> {
    resolver: R,
    config: DispatcherConfig,
    metrics: Arc<MirrorMetrics>,
    outcomes: Option<mpsc::UnboundedSender<MirrorOutcome>>,
}

impl<R> Dispatcher<R> {
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Mirror metrics of this dispatcher
    pub fn metrics(&self) -> &Arc<MirrorMetrics> {
        &self.metrics
    }
}

impl<R> Dispatcher<R>
where
    R: TargetResolver,
    R::Target: Sync + 'static,
    CursorOf<R>: 'static,
{
    /// Run `query` on the main target and replay it on every mirror
    ///
    /// `configs[0]` is the main target. Its cursor is returned undrained as
    /// soon as it is available; mirrors run in one detached task registered
    /// with `ctx` (or spawned unsupervised when there is none).
    ///
    /// # Errors
    /// Only main-path failures are returned: an empty target list, a failed
    /// resolution, or the main target failing to execute. Mirror failures are
    /// logged and never surface here.
    pub async fn query(
        &self,
        ctx: Option<&dyn ExecutionContext>,
        configs: &[TargetConfig],
        query: &Query,
    ) -> Result<CursorOf<R>, DispatcherError> {
        let fanout = Fanout {
            namespace: &self.config.namespace,
            settings: self.config.mirror,
            metrics: &self.metrics,
            outcomes: self.outcomes.as_ref(),
        };
        fanout.run(&self.resolver, ctx, configs, query).await
    }
}

/// One-shot fan-out with default mirror settings
///
/// Equivalent to building a [`Dispatcher`] for `namespace` and calling
/// [`Dispatcher::query`] once.
pub async fn multistub_query<R>(
    resolver: &R,
    namespace: &str,
    ctx: Option<&dyn ExecutionContext>,
    configs: &[TargetConfig],
    query: &Query,
) -> Result<CursorOf<R>, DispatcherError>
where
    R: TargetResolver,
    R::Target: Sync + 'static,
    CursorOf<R>: 'static,
{
    let metrics = Arc::new(MirrorMetrics::new());
    let fanout = Fanout {
        namespace,
        settings: MirrorSettings::default(),
        metrics: &metrics,
        outcomes: None,
    };
    fanout.run(resolver, ctx, configs, query).await
}

struct Fanout<'a> {
    namespace: &'a str,
    settings: MirrorSettings,
    metrics: &'a Arc<MirrorMetrics>,
    outcomes: Option<&'a mpsc::UnboundedSender<MirrorOutcome>>,
}

impl Fanout<'_> {
    #[instrument(
        name = "dispatcher_query",
        skip_all,
        fields(namespace = %self.namespace, targets = configs.len(), sql = %query.sql())
    )]
    async fn run<R>(
        &self,
        resolver: &R,
        ctx: Option<&dyn ExecutionContext>,
        configs: &[TargetConfig],
        query: &Query,
    ) -> Result<CursorOf<R>, DispatcherError>
    where
        R: TargetResolver,
        R::Target: Sync + 'static,
        CursorOf<R>: 'static,
    {
        if configs.is_empty() {
            return Err(DispatcherError::EmptyTargetSet);
        }

        let mut handles = resolver
            .resolve(self.namespace, configs)
            .await
            .map_err(|e| DispatcherError::resolution(self.namespace, e))?;

        if handles.is_empty() {
            return Err(DispatcherError::EmptyTargetSet);
        }
        if handles.len() != configs.len() {
            return Err(DispatcherError::ResolutionMismatch {
                expected: configs.len(),
                actual: handles.len(),
            });
        }

        let mirrors = handles.split_off(1);
        let main = handles.remove(0);

        let cursor = match main.exec(query).await {
            Ok(cursor) => {
                observability::record_main_query(main.name(), true);
                cursor
            }
            Err(e) => {
                observability::record_main_query(main.name(), false);
                return Err(DispatcherError::main_execution(main.name(), e));
            }
        };

        if !mirrors.is_empty() {
            self.schedule_mirrors(ctx, mirrors, query);
        }

        debug!(main = %main.name(), "Main cursor ready");
        Ok(cursor)
    }

    fn schedule_mirrors<T>(&self, ctx: Option<&dyn ExecutionContext>, mirrors: Vec<T>, query: &Query)
    where
        T: SqlTarget + Sync + 'static,
        T::Cursor: 'static,
    {
        let count = mirrors.len();
        let names: Vec<String> = mirrors.iter().map(|m| m.name().to_string()).collect();
        // Counted before the task is first polled so in_flight covers queued mirrors
        self.metrics.inc_fanouts();
        self.metrics.add_launched(count as u64);
        observability::record_fanout(count);

        let task = MirrorTask::new(
            mirrors,
            query.clone(),
            self.settings.capture_rows,
            Arc::clone(self.metrics),
            self.outcomes.cloned(),
        );
        let task: BackgroundTask = Box::pin(task.run());

        match ctx.filter(|_| self.settings.supervised) {
            Some(ctx) => {
                debug!(mirrors = count, "Mirror task registered with context");
                ctx.wait_until(task);
            }
            None => match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    debug!(mirrors = count, "Mirror task spawned unsupervised");
                    handle.spawn(task);
                }
                Err(e) => {
                    // Nothing can drive the task; it is dropped unpolled
                    self.metrics.add_failed(count as u64);
                    for name in &names {
                        observability::record_mirror_result(name, false);
                        error!(mirror = %name, error = %e, "Mirror execution error");
                    }
                }
            },
        }
    }
}
