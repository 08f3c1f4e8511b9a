//! FanoutBlueprint - Config Loader 输出
//!
//! 描述一次 fan-out 部署：命名空间、有序目标列表（首个为 main）、镜像策略、内存后端种子数据。

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{Row, TargetConfig};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的 fan-out 配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FanoutBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 目标所在的命名空间
    #[validate(length(min = 1, message = "namespace cannot be empty"))]
    pub namespace: String,

    /// 有序目标列表，第一个为 main，其余为 mirror
    #[validate(length(min = 1, message = "at least one target is required"), nested)]
    pub targets: Vec<TargetConfig>,

    /// 镜像执行策略
    #[serde(default)]
    pub mirror: MirrorSettings,

    /// 内存后端种子数据
    #[serde(default)]
    pub fixtures: Vec<FixtureConfig>,
}

impl FanoutBlueprint {
    /// main 目标
    pub fn main_target(&self) -> Option<&TargetConfig> {
        self.targets.first()
    }

    /// mirror 目标
    pub fn mirror_targets(&self) -> &[TargetConfig] {
        self.targets.get(1..).unwrap_or_default()
    }
}

/// 镜像执行策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorSettings {
    /// 保留 mirror 返回的行（用于比对），默认丢弃
    #[serde(default)]
    pub capture_rows: bool,

    /// 是否交给 ExecutionContext 托管；false 时直接 detach
    #[serde(default = "default_supervised")]
    pub supervised: bool,
}

fn default_supervised() -> bool {
    true
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            capture_rows: false,
            supervised: default_supervised(),
        }
    }
}

/// 内存后端的固定结果集
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureConfig {
    /// 完全匹配的 SQL 文本
    pub sql: String,

    /// 列名
    pub columns: Vec<String>,

    /// 行数据
    #[serde(default)]
    pub rows: Vec<Row>,

    /// 承载该结果集的目标（空 = 全部目标）
    #[serde(default)]
    pub targets: Vec<String>,
}

impl FixtureConfig {
    /// 该 fixture 是否作用于指定目标
    pub fn applies_to(&self, target: &str) -> bool {
        self.targets.is_empty() || self.targets.iter().any(|t| t == target)
    }
}
