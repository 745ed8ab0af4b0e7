//! Edge — one measured/assumed relation between two gene nodes.

use std::fmt;

use hashbrown::HashMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};
use super::Value;

/// Canonical undirected edge key: the two endpoint names sorted
/// lexicographically. Self-edges cannot be constructed.
///
/// Serializes as `"a|b"` so edge registries keyed by `EdgeKey` stay
/// plain JSON maps in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    a: String,
    b: String,
}

impl EdgeKey {
    pub fn new(x: &str, y: &str) -> Result<Self> {
        if x == y {
            return Err(Error::Domain(format!("self-edge on node '{x}'")));
        }
        let (a, b) = if x < y { (x, y) } else { (y, x) };
        Ok(Self { a: a.to_owned(), b: b.to_owned() })
    }

    /// Lexicographically smaller endpoint.
    pub fn a(&self) -> &str { &self.a }

    /// Lexicographically larger endpoint.
    pub fn b(&self) -> &str { &self.b }

    pub fn contains(&self, name: &str) -> bool {
        self.a == name || self.b == name
    }

    /// The endpoint opposite `name`, if `name` is an endpoint.
    pub fn other(&self, name: &str) -> Option<&str> {
        if self.a == name { Some(&self.b) }
        else if self.b == name { Some(&self.a) }
        else { None }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.a, self.b)
    }
}

impl Serialize for EdgeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EdgeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let (a, b) = s
            .split_once('|')
            .ok_or_else(|| D::Error::custom(format!("malformed edge key '{s}'")))?;
        EdgeKey::new(a, b).map_err(|e| D::Error::custom(e.to_string()))
    }
}

/// An undirected relation between two nodes, carrying per-metric data.
///
/// At most one `Edge` exists per unordered node pair: re-registering the
/// same pair merges new data keys into the existing edge object so
/// accumulated metric history is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub key: EdgeKey,
    /// metric/relation name → value. Values may be `Undefined`, which means
    /// "not computable" and is distinct from a valid zero.
    pub data: HashMap<String, Value>,
}

impl Edge {
    pub fn new(key: EdgeKey) -> Self {
        Self { key, data: HashMap::new() }
    }

    pub fn with_data(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    pub fn set_data(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Merge another registration of the same pair into this edge.
    pub fn merge_data(&mut self, other: HashMap<String, Value>) {
        for (k, v) in other {
            self.data.insert(k, v);
        }
    }
}
