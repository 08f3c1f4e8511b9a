//! 内存副本
//!
//! 用于测试与 CLI 演示的副本实现，支持注入失败、延迟与暂停。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use contracts::{ContractError, LocationHint, Query, Row, SqlTarget, Value};
use tokio::sync::watch;
use tracing::{debug, instrument};

use crate::cursor::MemoryCursor;

/// 副本行为配置（可注入失败场景）
#[derive(Debug, Default, Clone)]
pub struct ReplicaBehavior {
    /// 执行直接失败，携带错误信息
    pub fail_exec: Option<String>,
    /// 读取 N 行后游标失败
    pub fail_after_rows: Option<u64>,
    /// 每行读取前的延迟
    pub row_delay: Option<Duration>,
    /// 执行时 panic
    pub panic_on_exec: bool,
}

/// 已执行语句记录
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone)]
struct Fixture {
    columns: Vec<String>,
    rows: Vec<Row>,
}

/// 内存副本
#[derive(Debug)]
pub struct MemoryReplica {
    /// 副本名称
    name: String,
    /// 首次创建时的位置提示
    location_hint: Option<LocationHint>,
    /// SQL 文本 -> 结果集
    fixtures: Mutex<HashMap<String, Fixture>>,
    /// 执行日志
    journal: Mutex<Vec<ExecutedStatement>>,
    /// 行为配置
    behavior: Mutex<ReplicaBehavior>,
    /// 暂停开关
    paused: watch::Sender<bool>,
    /// 已完全读完的游标数
    completed: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl MemoryReplica {
    /// 创建副本
    pub fn new(name: impl Into<String>, location_hint: Option<LocationHint>) -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            name: name.into(),
            location_hint,
            fixtures: Mutex::new(HashMap::new()),
            journal: Mutex::new(Vec::new()),
            behavior: Mutex::new(ReplicaBehavior::default()),
            paused,
            completed: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location_hint(&self) -> Option<LocationHint> {
        self.location_hint
    }

    /// 写入固定结果集（按 SQL 文本完全匹配）
    pub fn seed(&self, sql: impl Into<String>, columns: Vec<String>, rows: Vec<Row>) {
        lock(&self.fixtures).insert(sql.into(), Fixture { columns, rows });
    }

    /// 替换行为配置
    pub fn set_behavior(&self, behavior: ReplicaBehavior) {
        *lock(&self.behavior) = behavior;
    }

    /// 当前行为配置
    pub fn behavior(&self) -> ReplicaBehavior {
        lock(&self.behavior).clone()
    }

    /// 暂停执行，后续 exec 将挂起直到 `resume`
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    /// 恢复执行
    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// 执行日志快照
    pub fn journal(&self) -> Vec<ExecutedStatement> {
        lock(&self.journal).clone()
    }

    /// 已执行语句数
    pub fn exec_count(&self) -> usize {
        lock(&self.journal).len()
    }

    /// 已完全读完的游标数
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    async fn wait_until_resumed(&self) -> Result<(), ContractError> {
        let mut rx = self.paused.subscribe();
        let resumed = rx.wait_for(|paused| !*paused).await.is_ok();
        if resumed {
            Ok(())
        } else {
            Err(ContractError::execution(&self.name, "replica shut down"))
        }
    }

    #[instrument(
        name = "memory_replica_exec",
        skip(self, query),
        fields(replica = %self.name, sql = %query.sql())
    )]
    async fn exec(self: &Arc<Self>, query: &Query) -> Result<MemoryCursor, ContractError> {
        self.wait_until_resumed().await?;

        lock(&self.journal).push(ExecutedStatement {
            sql: query.sql().to_string(),
            params: query.params().to_vec(),
        });

        let behavior = self.behavior();
        if behavior.panic_on_exec {
            panic!("injected panic on replica '{}'", self.name);
        }
        if let Some(message) = behavior.fail_exec {
            return Err(ContractError::execution(&self.name, message));
        }

        let fixture = lock(&self.fixtures).get(query.sql()).cloned();
        let (columns, rows) = match fixture {
            Some(f) => (f.columns, f.rows),
            None => (Vec::new(), Vec::new()),
        };

        debug!(replica = %self.name, rows = rows.len(), "Statement accepted");

        Ok(MemoryCursor::new(
            Arc::clone(self),
            columns,
            rows,
            behavior.fail_after_rows,
            behavior.row_delay,
        ))
    }
}

/// 副本句柄（解析结果）
#[derive(Debug, Clone)]
pub struct MemoryTarget {
    replica: Arc<MemoryReplica>,
}

impl MemoryTarget {
    pub fn new(replica: Arc<MemoryReplica>) -> Self {
        Self { replica }
    }

    pub fn replica(&self) -> &Arc<MemoryReplica> {
        &self.replica
    }
}

impl SqlTarget for MemoryTarget {
    type Cursor = MemoryCursor;

    fn name(&self) -> &str {
        self.replica.name()
    }

    async fn exec(&self, query: &Query) -> Result<MemoryCursor, ContractError> {
        self.replica.exec(query).await
    }
}
