//! 内存命名空间
//!
//! 负责把 `TargetConfig` 解析为副本句柄，副本按名称惰性创建。

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use contracts::{
    ContractError, FanoutBlueprint, LocationHint, TargetConfig, TargetResolver,
};
use tracing::{debug, instrument};

use crate::replica::{MemoryReplica, MemoryTarget};

#[derive(Debug)]
struct NamespaceInner {
    name: String,
    replicas: Mutex<BTreeMap<String, Arc<MemoryReplica>>>,
    fail_resolution: AtomicBool,
    resolve_count: AtomicU64,
}

/// 内存命名空间（可克隆，共享同一组副本）
#[derive(Debug, Clone)]
pub struct MemoryNamespace {
    inner: Arc<NamespaceInner>,
}

impl MemoryNamespace {
    /// 创建空命名空间
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(NamespaceInner {
                name: name.into(),
                replicas: Mutex::new(BTreeMap::new()),
                fail_resolution: AtomicBool::new(false),
                resolve_count: AtomicU64::new(0),
            }),
        }
    }

    /// 从配置蓝图创建，并写入 fixture
    pub fn from_blueprint(blueprint: &FanoutBlueprint) -> Self {
        let namespace = Self::new(&blueprint.namespace);
        for target in &blueprint.targets {
            let replica = namespace.replica_with_hint(&target.name, target.location_hint);
            for fixture in &blueprint.fixtures {
                if fixture.applies_to(&target.name) {
                    replica.seed(
                        fixture.sql.clone(),
                        fixture.columns.clone(),
                        fixture.rows.clone(),
                    );
                }
            }
        }
        namespace
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// 获取或创建副本
    pub fn replica(&self, name: &str) -> Arc<MemoryReplica> {
        self.replica_with_hint(name, None)
    }

    /// 获取或创建副本；位置提示仅在首次创建时生效
    pub fn replica_with_hint(&self, name: &str, hint: Option<LocationHint>) -> Arc<MemoryReplica> {
        let mut replicas = self
            .inner
            .replicas
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            replicas
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(MemoryReplica::new(name, hint))),
        )
    }

    /// 已创建的副本名称（按名称排序）
    pub fn replica_names(&self) -> Vec<String> {
        self.inner
            .replicas
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// 注入解析失败
    pub fn set_fail_resolution(&self, fail: bool) {
        self.inner.fail_resolution.store(fail, Ordering::SeqCst);
    }

    /// resolve 被调用的次数
    pub fn resolve_count(&self) -> u64 {
        self.inner.resolve_count.load(Ordering::SeqCst)
    }
}

impl TargetResolver for MemoryNamespace {
    type Target = MemoryTarget;

    #[instrument(
        name = "memory_namespace_resolve",
        skip(self, configs),
        fields(namespace = %namespace, targets = configs.len())
    )]
    async fn resolve(
        &self,
        namespace: &str,
        configs: &[TargetConfig],
    ) -> Result<Vec<MemoryTarget>, ContractError> {
        self.inner.resolve_count.fetch_add(1, Ordering::SeqCst);

        if namespace != self.inner.name {
            return Err(ContractError::resolution(
                namespace,
                format!("unknown namespace (serving '{}')", self.inner.name),
            ));
        }
        if self.inner.fail_resolution.load(Ordering::SeqCst) {
            return Err(ContractError::resolution(namespace, "injected resolution failure"));
        }

        let targets: Vec<_> = configs
            .iter()
            .map(|c| MemoryTarget::new(self.replica_with_hint(&c.name, c.location_hint)))
            .collect();

        debug!(resolved = targets.len(), "Targets resolved");
        Ok(targets)
    }
}
