//! Command implementations.

mod info;
mod query;
mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::FanoutBlueprint;

use crate::error::CliError;

pub use info::run_info;
pub use query::run_query;
pub use validate::run_validate;

/// Load and validate the blueprint at `path`
fn load_blueprint(path: &Path) -> Result<FanoutBlueprint> {
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }

    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
