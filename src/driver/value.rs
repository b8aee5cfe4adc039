//! Argument and column values exchanged with a driver.

use chrono::{DateTime, Utc};

use crate::error::DriverResult;

/// A value a driver accepts as an argument or produces as a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
    Str(String),
    Time(DateTime<Utc>),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Time(v)
    }
}

/// An argument for a context-aware call: a value plus its position and
/// optional parameter name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    /// Parameter name, if the caller bound it by name.
    pub name: Option<String>,
    /// 1-based position of the argument.
    pub ordinal: usize,
    pub value: Value,
}

impl NamedValue {
    pub fn positional(ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            name: None,
            ordinal,
            value: value.into(),
        }
    }

    pub fn named(name: impl Into<String>, ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            name: Some(name.into()),
            ordinal,
            value: value.into(),
        }
    }
}

/// Build named values from positional ones, numbering them from 1.
pub fn values_to_named_values(args: &[Value]) -> Vec<NamedValue> {
    args.iter()
        .enumerate()
        .map(|(i, v)| NamedValue::positional(i + 1, v.clone()))
        .collect()
}

/// Drop names and ordinals, keeping the values in order.
///
/// Used for logging arguments of context-aware calls; it never feeds the
/// driver.
pub fn named_values_to_values(args: &[NamedValue]) -> Vec<Value> {
    args.iter().map(|nv| nv.value.clone()).collect()
}

/// Converts an argument into a value the driver can bind.
pub trait ValueConverter: Send + Sync {
    fn convert_value(&self, value: Value) -> DriverResult<Value>;
}

/// Passes every value through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParameterConverter;

impl ValueConverter for DefaultParameterConverter {
    fn convert_value(&self, value: Value) -> DriverResult<Value> {
        Ok(value)
    }
}
