//! Target descriptors and the resolution / execution seams
//!
//! Resolving a descriptor to a live handle and running a statement on that
//! handle are both owned by external collaborators. The dispatcher only sees
//! these traits.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{ContractError, Query, RowCursor};

/// Placement hint forwarded to the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationHint {
    /// Western North America
    Wnam,
    /// Eastern North America
    Enam,
    /// South America
    Sam,
    /// Western Europe
    Weur,
    /// Eastern Europe
    Eeur,
    /// Asia-Pacific
    Apac,
    /// Oceania
    Oc,
    /// Africa
    Afr,
    /// Middle East
    Me,
}

impl LocationHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wnam => "wnam",
            Self::Enam => "enam",
            Self::Sam => "sam",
            Self::Weur => "weur",
            Self::Eeur => "eeur",
            Self::Apac => "apac",
            Self::Oc => "oc",
            Self::Afr => "afr",
            Self::Me => "me",
        }
    }
}

impl std::fmt::Display for LocationHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of one replica to query
///
/// Order inside a call is load-bearing: the first descriptor names the main
/// target, every following one a mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TargetConfig {
    /// Named instance key inside the namespace
    #[validate(length(min = 1, message = "target name cannot be empty"))]
    pub name: String,

    /// Optional locality hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_hint: Option<LocationHint>,
}

impl TargetConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location_hint: None,
        }
    }

    pub fn with_location_hint(mut self, hint: LocationHint) -> Self {
        self.location_hint = Some(hint);
        self
    }
}

/// A resolved, live handle to one replica
#[trait_variant::make(SqlTarget: Send)]
pub trait LocalSqlTarget {
    /// Cursor produced by [`exec`](Self::exec)
    type Cursor: RowCursor;

    /// Target name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Execute one statement with positional parameters
    ///
    /// Returns as soon as the cursor is available; rows are produced lazily.
    ///
    /// # Errors
    /// Fails when the statement cannot be started on this handle. Failures
    /// while reading rows surface from the cursor instead.
    async fn exec(&self, query: &Query) -> Result<Self::Cursor, ContractError>;
}

/// Resolves descriptors to live handles
#[trait_variant::make(TargetResolver: Send)]
pub trait LocalTargetResolver {
    /// Handle type produced by this resolver
    type Target: SqlTarget;

    /// Resolve `configs` inside `namespace`
    ///
    /// Must return handles in the same order as `configs`. The resolver does
    /// not know which handle is main; that is the dispatcher's convention.
    async fn resolve(
        &self,
        namespace: &str,
        configs: &[TargetConfig],
    ) -> Result<Vec<Self::Target>, ContractError>;
}
