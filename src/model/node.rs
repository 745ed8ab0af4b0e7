//! Node — one gene/transcript in one species.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::Value;

/// Reserved name for the injected target node. No real gene may use it.
pub const TARGET_NAME: &str = "__target__";

/// Feature-kind → feature value (e.g. `expression_vector` → FloatVec).
pub type FeatureMap = HashMap<String, Value>;

/// A gene node in the relation graph.
///
/// Created once per unique name by whichever parser first encounters it;
/// later parsers merge additional feature keys into `data`. The poll and
/// score fields stay empty until the voting/scoring phases run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique across the whole graph. Cross-species symbol collisions are
    /// assumed disambiguated upstream.
    pub name: String,
    /// `None` only for the injected target.
    pub species: Option<String>,
    pub is_target: bool,
    pub data: FeatureMap,
    /// metric name → aggregated consensus value, populated by `take_votes`.
    pub poll_results: HashMap<String, Value>,
    /// metric name → ordered list of contributing neighbor names.
    pub voters_per_metric: HashMap<String, Vec<String>>,
    pub combo_score: Option<f64>,
    pub bayesian_score: Option<f64>,
}

impl Node {
    pub fn new(name: impl Into<String>, species: Option<&str>) -> Self {
        Self {
            name: name.into(),
            species: species.map(str::to_owned),
            is_target: false,
            data: FeatureMap::new(),
            poll_results: HashMap::new(),
            voters_per_metric: HashMap::new(),
            combo_score: None,
            bayesian_score: None,
        }
    }

    pub fn with_feature(mut self, kind: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(kind.into(), value.into());
        self
    }

    pub fn set_feature(&mut self, kind: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(kind.into(), value.into());
    }

    pub fn feature(&self, kind: &str) -> Option<&Value> {
        self.data.get(kind)
    }

    /// Merge feature keys from another registration of the same gene.
    /// Later parsers add keys; existing keys are overwritten by the newer
    /// registration (last parser wins for a given kind).
    pub fn merge_features(&mut self, other: FeatureMap) {
        for (k, v) in other {
            self.data.insert(k, v);
        }
    }

    /// Build the transient target node from this node.
    ///
    /// Explicit field-by-field reconstruction rather than a struct clone:
    /// the target gets its own feature map and fresh poll/score containers,
    /// so no container is aliased with the source node.
    pub fn clone_as_target(&self) -> Node {
        Node {
            name: TARGET_NAME.to_owned(),
            species: None,
            is_target: true,
            data: self.data.clone(),
            poll_results: HashMap::new(),
            voters_per_metric: HashMap::new(),
            combo_score: None,
            bayesian_score: None,
        }
    }

    /// Total number of votes received across all metrics.
    pub fn total_votes(&self) -> usize {
        self.voters_per_metric.values().map(Vec::len).sum()
    }
}
