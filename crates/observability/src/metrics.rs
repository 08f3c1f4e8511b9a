//! Fan-out 指标收集模块
//!
//! 记录 main 查询与 mirror 执行的运行指标，并提供内存聚合统计。

use std::collections::HashMap;

use metrics::{counter, gauge, histogram};

/// 记录一次 fan-out 调用
///
/// 每次 dispatcher 成功拿到 main 游标后调用。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_fanout;
///
/// record_fanout(mirrors.len());
/// ```
pub fn record_fanout(mirrors: usize) {
    counter!("multistub_fanout_total").increment(1);
    gauge!("multistub_fanout_mirrors").set(mirrors as f64);
    histogram!("multistub_fanout_mirrors_hist").record(mirrors as f64);
}

/// 记录 main 查询结果
pub fn record_main_query(target: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "multistub_main_queries_total",
        "target" => target.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录 mirror 执行结果
pub fn record_mirror_result(target: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "multistub_mirror_executions_total",
        "target" => target.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录 mirror 读取的行数
pub fn record_mirror_rows(target: &str, rows: u64) {
    counter!(
        "multistub_mirror_rows_drained_total",
        "target" => target.to_string()
    )
    .increment(rows);
}

/// 记录 mirror 执行耗时 (从执行开始到游标读完)
pub fn record_mirror_latency_ms(latency_ms: f64) {
    histogram!("multistub_mirror_latency_ms").record(latency_ms);
}

/// Fan-out 指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct FanoutStatsAggregator {
    /// mirror 执行总数
    pub total_mirrors: u64,

    /// 成功数
    pub succeeded: u64,

    /// 失败数
    pub failed: u64,

    /// 读取总行数
    pub rows_drained: u64,

    /// 耗时统计 (毫秒)
    pub latency_stats: RunningStats,

    /// 各目标失败次数
    pub failure_counts: HashMap<String, u64>,
}

impl FanoutStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次成功的 mirror 执行
    pub fn record_success(&mut self, rows: u64, latency_ms: f64) {
        self.total_mirrors += 1;
        self.succeeded += 1;
        self.rows_drained += rows;
        self.latency_stats.push(latency_ms);
    }

    /// 记录一次失败的 mirror 执行
    pub fn record_failure(&mut self, target: &str, latency_ms: f64) {
        self.total_mirrors += 1;
        self.failed += 1;
        self.latency_stats.push(latency_ms);
        *self.failure_counts.entry(target.to_string()).or_insert(0) += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> FanoutSummary {
        FanoutSummary {
            total_mirrors: self.total_mirrors,
            succeeded: self.succeeded,
            failed: self.failed,
            rows_drained: self.rows_drained,
            failure_rate: if self.total_mirrors > 0 {
                self.failed as f64 / self.total_mirrors as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_stats),
            failure_counts: self.failure_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct FanoutSummary {
    pub total_mirrors: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub rows_drained: u64,
    pub failure_rate: f64,
    pub latency_ms: StatsSummary,
    pub failure_counts: HashMap<String, u64>,
}

impl std::fmt::Display for FanoutSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Mirror Summary ===")?;
        writeln!(f, "Mirror executions: {}", self.total_mirrors)?;
        writeln!(f, "Succeeded: {}", self.succeeded)?;
        writeln!(
            f,
            "Failed: {} ({:.2}%)",
            self.failed, self.failure_rate
        )?;
        writeln!(f, "Rows drained: {}", self.rows_drained)?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;

        if !self.failure_counts.is_empty() {
            let mut targets: Vec<_> = self.failure_counts.iter().collect();
            targets.sort();
            writeln!(f, "Failures by target:")?;
            for (target, count) in targets {
                writeln!(f, "  {}: {}", target, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
