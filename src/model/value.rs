//! Value type carried by node features and edge data.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A node feature, edge attribute, or metric result.
///
/// `Undefined` is a first-class sentinel for "could not be computed due to
/// missing input". It is distinct from a valid zero and propagates silently
/// through aggregation (excluded, never treated as 0.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Undefined,
    Bool(bool),
    Float(f64),
    FloatVec(Vec<f64>),
    /// Pairwise species divergence plus the dataset-wide min/max used to
    /// rescale it (the PTCI weight inputs).
    Divergence { d: f64, d_min: f64, d_max: f64 },
    Text(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "UNDEFINED",
            Value::Bool(_) => "BOOLEAN",
            Value::Float(_) => "FLOAT",
            Value::FloatVec(_) => "FLOAT_VEC",
            Value::Divergence { .. } => "DIVERGENCE",
            Value::Text(_) => "TEXT",
        }
    }

    /// True unless the value is `Undefined` or a non-finite float.
    /// NaN floats written by upstream tools count as undefined so they are
    /// excluded from aggregation the same way.
    pub fn is_defined(&self) -> bool {
        match self {
            Value::Undefined => false,
            Value::Float(f) => f.is_finite(),
            _ => true,
        }
    }

    /// Extract as f64. `Undefined`, NaN, and non-numeric variants yield None.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) if f.is_finite() => Some(*f),
            _ => None,
        }
    }

    pub fn as_float_vec(&self) -> Option<&[f64]> {
        match self {
            Value::FloatVec(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_divergence(&self) -> Option<(f64, f64, f64)> {
        match self {
            Value::Divergence { d, d_min, d_max } => Some((*d, *d_min, *d_max)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Bool(v) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(v) } }
impl From<Vec<f64>> for Value { fn from(v: Vec<f64>) -> Self { Value::FloatVec(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::Text(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::Text(v.to_owned()) } }

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::FloatVec(v) => {
                write!(f, "[")?;
                for (i, x) in v.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{x}")?;
                }
                write!(f, "]")
            }
            Value::Divergence { d, d_min, d_max } => {
                write!(f, "divergence({d} in [{d_min}, {d_max}])")
            }
            Value::Text(s) => write!(f, "\"{s}\""),
        }
    }
}
