//! Query values - positional parameters and row cells
//!
//! Parameters are type-erased at the dispatcher boundary, so they are carried
//! as a closed set of tagged values instead of a dynamically typed list.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::ContractError;

/// A single SQL value
///
/// Untagged on the wire so fixture files can use plain literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL
    Null,
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point
    Real(f64),
    /// UTF-8 text
    Text(String),
    /// Opaque binary data
    Blob(Bytes),
}

impl Value {
    /// Kind name used in logs and CLI output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "int",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Self::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Self::Blob(v) => {
                write!(f, "X'")?;
                for b in v.iter() {
                    write!(f, "{b:02X}")?;
                }
                write!(f, "'")
            }
        }
    }
}

/// Parses CLI parameter syntax
///
/// Accepts `null`, `int:<n>`, `real:<f>`, `text:<s>`, `blob:<hex>`, or a bare
/// literal (integer first, then float, otherwise text).
impl FromStr for Value {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("null") {
            return Ok(Self::Null);
        }

        if let Some((kind, raw)) = s.split_once(':') {
            match kind {
                "int" => {
                    return raw.parse().map(Self::Integer).map_err(|e| {
                        ContractError::Other(format!("invalid int parameter '{raw}': {e}"))
                    })
                }
                "real" => {
                    return raw.parse().map(Self::Real).map_err(|e| {
                        ContractError::Other(format!("invalid real parameter '{raw}': {e}"))
                    })
                }
                "text" => return Ok(Self::Text(raw.to_string())),
                "blob" => return decode_hex(raw).map(|b| Self::Blob(Bytes::from(b))),
                _ => {}
            }
        }

        if let Ok(v) = s.parse::<i64>() {
            return Ok(Self::Integer(v));
        }
        if let Ok(v) = s.parse::<f64>() {
            return Ok(Self::Real(v));
        }
        Ok(Self::Text(s.to_string()))
    }
}

fn decode_hex(raw: &str) -> Result<Vec<u8>, ContractError> {
    if !raw.is_ascii() || raw.len() % 2 != 0 {
        return Err(ContractError::Other(format!(
            "invalid blob parameter '{raw}': expected an even number of hex digits"
        )));
    }
    (0..raw.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&raw[i..i + 2], 16)
                .map_err(|e| ContractError::Other(format!("invalid blob parameter '{raw}': {e}")))
        })
        .collect()
}

/// One result row, cells in column order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Cell at `idx`, if present
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

/// Immutable SQL statement with positional parameters
///
/// Cloning is cheap; the same `Query` is handed unchanged to the main target
/// and to every mirror.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    sql: Arc<str>,
    params: Arc<[Value]>,
}

impl Query {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: Arc::from(sql.into()),
            params: Arc::from(params),
        }
    }

    /// Statement without parameters
    pub fn sql_only(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}
