//! 配置校验模块
//!
//! 校验规则：
//! - 结构校验 (namespace 非空、至少一个目标、目标名非空)
//! - 目标名唯一
//! - fixture 至少一列，且每行宽度与列数一致
//! - fixture 引用的目标必须存在

use std::collections::HashSet;

use contracts::{ContractError, FanoutBlueprint};
use validator::Validate;

/// 校验 FanoutBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &FanoutBlueprint) -> Result<(), ContractError> {
    validate_schema(blueprint)?;
    validate_target_names(blueprint)?;
    validate_fixtures(blueprint)?;
    Ok(())
}

/// 结构校验 (derive 规则)
fn validate_schema(blueprint: &FanoutBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("blueprint", e.to_string()))
}

/// 校验目标名唯一性
fn validate_target_names(blueprint: &FanoutBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, target) in blueprint.targets.iter().enumerate() {
        if !seen.insert(target.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("targets[{}].name", idx),
                format!("duplicate target name '{}'", target.name),
            ));
        }
    }
    Ok(())
}

/// 校验 fixture
fn validate_fixtures(blueprint: &FanoutBlueprint) -> Result<(), ContractError> {
    let target_names: HashSet<_> = blueprint.targets.iter().map(|t| t.name.as_str()).collect();

    for (idx, fixture) in blueprint.fixtures.iter().enumerate() {
        if fixture.sql.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("fixtures[{}].sql", idx),
                "fixture sql cannot be empty",
            ));
        }

        if fixture.columns.is_empty() {
            return Err(ContractError::config_validation(
                format!("fixtures[{}].columns", idx),
                "fixture must declare at least one column",
            ));
        }

        for (row_idx, row) in fixture.rows.iter().enumerate() {
            if row.len() != fixture.columns.len() {
                return Err(ContractError::config_validation(
                    format!("fixtures[{}].rows[{}]", idx, row_idx),
                    format!(
                        "row has {} values but fixture declares {} columns",
                        row.len(),
                        fixture.columns.len()
                    ),
                ));
            }
        }

        for target in &fixture.targets {
            if !target_names.contains(target.as_str()) {
                return Err(ContractError::config_validation(
                    format!("fixtures[{}].targets", idx),
                    format!("target '{}' not found in configured targets", target),
                ));
            }
        }
    }
    Ok(())
}
