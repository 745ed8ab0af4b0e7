//! Pluggable relation metrics and the registry that runs them.
//!
//! Each metric consumes an edge's two endpoint nodes and writes a scalar
//! (or `Undefined`) result under its own key in the edge's data map.
//! Missing input is never an error: it maps to `Value::Undefined`, which
//! downstream aggregation excludes. Only genuinely invalid numeric input
//! (divergence outside its declared range) surfaces as a domain error.

pub mod pearson;
pub mod weight;

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution, OrderStatistics};
use tracing::{info, warn};

use crate::graph::GeneGraph;
use crate::model::{Edge, Node, Value};
use crate::{Error, Result};

pub use pearson::pearson;
pub use weight::{divergence_weight, W_MAX_DEFAULT, W_MIN_DEFAULT};

// ============================================================================
// Feature / edge-data keys
// ============================================================================

pub const EXPRESSION_VECTOR: &str = "expression_vector";
pub const TFBS_VECTOR: &str = "tfbs_vector";
pub const BRANCH_LENGTH: &str = "branch_length";
pub const DIVERGENCE: &str = "divergence";

/// Suffix for z-scored copies of a metric's edge values.
pub const STANDARDIZED_SUFFIX: &str = "_std";

// ============================================================================
// MetricKind — the closed set of relation metrics
// ============================================================================

/// The supported relation metrics. A closed enumeration: the set is small
/// and each member has a distinct numeric contract, so there is no open
/// subclassing seam here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// Pearson r between the endpoints' expression vectors.
    ExpressionSimilarity,
    /// Pearson r between the endpoints' TFBS score vectors.
    TfbsSimilarity,
    /// Pass-through of the phylogenetic distance a parser stored at
    /// edge-creation time. Records the distribution, computes nothing.
    BranchLength,
    /// Phylogenetic-Transcriptomic Correlation Index:
    /// `r * (1 - p) * w(d)` over the expression correlation and the
    /// divergence weight.
    Ptci,
}

impl MetricKind {
    /// The edge-data key this metric writes (and is addressed by).
    pub fn name(self) -> &'static str {
        match self {
            MetricKind::ExpressionSimilarity => "expression_vector_similarity",
            MetricKind::TfbsSimilarity => "tfbs_vector_similarity",
            MetricKind::BranchLength => BRANCH_LENGTH,
            MetricKind::Ptci => "PTCI",
        }
    }
}

// ============================================================================
// Metric — one named, stateful computation unit
// ============================================================================

/// A metric plus its voting eligibility and running value history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub kind: MetricKind,
    /// Whether this metric participates in neighbor voting.
    pub poll_me: bool,
    /// Every defined value this metric has produced, append-only. Feeds the
    /// distribution summaries and per-run standardization.
    recorded_values: Vec<f64>,
}

impl Metric {
    pub fn new(kind: MetricKind) -> Self {
        Self { kind, poll_me: false, recorded_values: Vec::new() }
    }

    pub fn with_polling(mut self) -> Self {
        self.poll_me = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Compute this metric for one edge. Missing required features yield
    /// `Value::Undefined`; only divergence-range violations error.
    fn compute(&self, edge: &Edge, node1: &Node, node2: &Node) -> Result<Value> {
        match self.kind {
            MetricKind::ExpressionSimilarity => {
                Ok(vector_similarity(node1, node2, EXPRESSION_VECTOR).map_or(Value::Undefined, |(r, _)| Value::Float(r)))
            }
            MetricKind::TfbsSimilarity => {
                Ok(vector_similarity(node1, node2, TFBS_VECTOR).map_or(Value::Undefined, |(r, _)| Value::Float(r)))
            }
            MetricKind::BranchLength => {
                Ok(edge.get(BRANCH_LENGTH).cloned().unwrap_or(Value::Undefined))
            }
            MetricKind::Ptci => {
                let Some((r, p)) = vector_similarity(node1, node2, EXPRESSION_VECTOR) else {
                    return Ok(Value::Undefined);
                };
                let Some((d, d_min, d_max)) = edge.get(DIVERGENCE).and_then(Value::as_divergence) else {
                    return Ok(Value::Undefined);
                };
                let w = divergence_weight(d, d_min, d_max, W_MIN_DEFAULT, W_MAX_DEFAULT)?;
                Ok(Value::Float(r * (1.0 - p) * w))
            }
        }
    }

    /// Compute, store into the edge, and record the result.
    ///
    /// Branch length is the exception: its value was set when the edge was
    /// registered, so it is only read back for the running distribution.
    pub fn measure_relation(&mut self, edge: &mut Edge, node1: &Node, node2: &Node) -> Result<()> {
        let value = self.compute(edge, node1, node2)?;
        if let Some(v) = value.as_float() {
            self.recorded_values.push(v);
        }
        if self.kind != MetricKind::BranchLength {
            edge.set_data(self.name(), value);
        }
        Ok(())
    }

    // ========================================================================
    // Running distribution summaries
    // ========================================================================

    pub fn recorded_values(&self) -> &[f64] {
        &self.recorded_values
    }

    pub fn clear_recorded(&mut self) {
        self.recorded_values.clear();
    }

    /// Mean of recorded values strictly greater than `threshold`.
    pub fn mean_above(&self, threshold: f64) -> Option<f64> {
        let kept: Vec<f64> = self.recorded_values.iter().copied().filter(|v| *v > threshold).collect();
        if kept.is_empty() {
            return None;
        }
        Data::new(kept).mean()
    }

    /// Median of recorded values strictly greater than `threshold`.
    pub fn median_above(&self, threshold: f64) -> Option<f64> {
        let kept: Vec<f64> = self.recorded_values.iter().copied().filter(|v| *v > threshold).collect();
        if kept.is_empty() {
            return None;
        }
        Some(Data::new(kept).median())
    }

    /// Population standard deviation and median of all recorded values.
    fn distribution_stats(&self) -> Option<(f64, f64)> {
        if self.recorded_values.len() < 2 {
            return None;
        }
        let mut data = Data::new(self.recorded_values.clone());
        let median = data.median();
        let mean = data.mean()?;
        let var = self.recorded_values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            / self.recorded_values.len() as f64;
        Some((median, var.sqrt()))
    }
}

// ============================================================================
// MetricSet — the registry
// ============================================================================

/// Name-unique registry of metrics, applied in registration order.
///
/// Registration order is the only iteration order, so measurement runs are
/// deterministic — a requirement for reproducible null-distribution runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricSet {
    metrics: Vec<Metric>,
}

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard panel: both similarity metrics and PTCI vote; branch
    /// length only records its distribution.
    pub fn default_panel() -> Self {
        Self {
            metrics: vec![
                Metric::new(MetricKind::ExpressionSimilarity).with_polling(),
                Metric::new(MetricKind::TfbsSimilarity).with_polling(),
                Metric::new(MetricKind::BranchLength),
                Metric::new(MetricKind::Ptci).with_polling(),
            ],
        }
    }

    pub fn register(&mut self, metric: Metric) -> Result<()> {
        if self.metrics.iter().any(|m| m.name() == metric.name()) {
            return Err(Error::Configuration(format!(
                "metric '{}' is already registered",
                metric.name()
            )));
        }
        self.metrics.push(metric);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Metric> {
        self.metrics.iter()
    }

    /// Names of the metrics eligible for neighbor voting, in registration
    /// order.
    pub fn vote_types(&self) -> Vec<String> {
        self.metrics.iter().filter(|m| m.poll_me).map(|m| m.name().to_owned()).collect()
    }

    /// Apply every metric to every edge in the graph, in deterministic
    /// (registry × registration) order.
    pub fn measure_relations(&mut self, graph: &mut GeneGraph) -> Result<()> {
        let keys = graph.edge_keys();
        info!(edges = keys.len(), metrics = self.metrics.len(), "measuring relations");
        for key in &keys {
            let (edge, node1, node2) = graph.edge_with_endpoints_mut(key)?;
            for metric in &mut self.metrics {
                metric.measure_relation(edge, node1, node2)?;
            }
        }
        Ok(())
    }

    /// Apply only the voting-eligible metrics to one detached edge.
    /// Used during target installation, where the target node is not yet
    /// registered in the graph.
    pub fn measure_edge_for_voting(&mut self, edge: &mut Edge, node1: &Node, node2: &Node) -> Result<()> {
        for metric in self.metrics.iter_mut().filter(|m| m.poll_me) {
            metric.measure_relation(edge, node1, node2)?;
        }
        Ok(())
    }

    /// Drop all recorded distributions. Each null-distribution repetition
    /// starts from a clean slate so its statistics describe only that run.
    pub fn clear_recorded(&mut self) {
        for metric in &mut self.metrics {
            metric.clear_recorded();
        }
    }

    /// Write a z-scored copy of `name`'s edge values (against the current
    /// run's median and standard deviation) under `"<name>_std"`.
    pub fn standardize_metric(&self, graph: &mut GeneGraph, name: &str) -> Result<()> {
        let metric = self
            .get(name)
            .ok_or_else(|| Error::Configuration(format!("unknown metric '{name}'")))?;
        let Some((median, std_dev)) = metric.distribution_stats() else {
            warn!(metric = name, "too few recorded values to standardize");
            return Ok(());
        };
        if std_dev == 0.0 {
            warn!(metric = name, "zero spread, skipping standardization");
            return Ok(());
        }

        let std_key = format!("{name}{STANDARDIZED_SUFFIX}");
        for key in graph.edge_keys() {
            let Some(edge) = graph.edge_between_mut(key.a(), key.b()) else { continue };
            if let Some(v) = edge.get(name).and_then(Value::as_float) {
                edge.set_data(std_key.clone(), Value::Float((v - median) / std_dev));
            }
        }
        Ok(())
    }
}

fn vector_similarity(node1: &Node, node2: &Node, kind: &str) -> Option<(f64, f64)> {
    let x = node1.feature(kind)?.as_float_vec()?;
    let y = node2.feature(kind)?.as_float_vec()?;
    pearson(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EdgeKey;

    fn nodes_with_expression() -> (Node, Node) {
        let a = Node::new("a", Some("sp1")).with_feature(EXPRESSION_VECTOR, vec![1.0, 2.0, 3.0, 4.0]);
        let b = Node::new("b", Some("sp2")).with_feature(EXPRESSION_VECTOR, vec![2.0, 4.0, 6.0, 8.0]);
        (a, b)
    }

    fn bare_edge() -> Edge {
        Edge::new(EdgeKey::new("a", "b").unwrap())
    }

    #[test]
    fn test_expression_similarity_perfect() {
        let (a, b) = nodes_with_expression();
        let mut metric = Metric::new(MetricKind::ExpressionSimilarity);
        let mut edge = bare_edge();

        metric.measure_relation(&mut edge, &a, &b).unwrap();

        let r = edge.get(metric.name()).unwrap().as_float().unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        assert_eq!(metric.recorded_values(), &[r]);
    }

    #[test]
    fn test_missing_feature_is_undefined_and_not_recorded() {
        let a = Node::new("a", Some("sp1")); // no expression vector
        let b = Node::new("b", Some("sp2")).with_feature(EXPRESSION_VECTOR, vec![1.0, 2.0, 3.0]);
        let mut metric = Metric::new(MetricKind::ExpressionSimilarity);
        let mut edge = bare_edge();

        metric.measure_relation(&mut edge, &a, &b).unwrap();

        assert_eq!(edge.get(metric.name()), Some(&Value::Undefined));
        assert!(metric.recorded_values().is_empty());
    }

    #[test]
    fn test_degenerate_vector_is_undefined() {
        let a = Node::new("a", Some("sp1")).with_feature(EXPRESSION_VECTOR, vec![5.0, 5.0, 5.0]);
        let b = Node::new("b", Some("sp2")).with_feature(EXPRESSION_VECTOR, vec![1.0, 2.0, 3.0]);
        let mut metric = Metric::new(MetricKind::ExpressionSimilarity);
        let mut edge = bare_edge();

        metric.measure_relation(&mut edge, &a, &b).unwrap();
        assert_eq!(edge.get(metric.name()), Some(&Value::Undefined));
    }

    #[test]
    fn test_branch_length_pass_through() {
        let (a, b) = nodes_with_expression();
        let mut metric = Metric::new(MetricKind::BranchLength);
        let mut edge = bare_edge().with_data(BRANCH_LENGTH, 0.37);

        metric.measure_relation(&mut edge, &a, &b).unwrap();

        // Value untouched, distribution recorded.
        assert_eq!(edge.get(BRANCH_LENGTH), Some(&Value::Float(0.37)));
        assert_eq!(metric.recorded_values(), &[0.37]);
    }

    #[test]
    fn test_ptci_composite() {
        let (a, b) = nodes_with_expression();
        let mut metric = Metric::new(MetricKind::Ptci);
        let mut edge = bare_edge().with_data(
            DIVERGENCE,
            Value::Divergence { d: 5.0, d_min: 0.0, d_max: 10.0 },
        );

        metric.measure_relation(&mut edge, &a, &b).unwrap();

        // r = 1, p = 0, w(5) = 1.05 → PTCI = 1.05
        let ptci = edge.get("PTCI").unwrap().as_float().unwrap();
        assert!((ptci - 1.05).abs() < 1e-9, "PTCI = {ptci}");
    }

    #[test]
    fn test_ptci_missing_divergence_is_undefined() {
        let (a, b) = nodes_with_expression();
        let mut metric = Metric::new(MetricKind::Ptci);
        let mut edge = bare_edge();

        metric.measure_relation(&mut edge, &a, &b).unwrap();
        assert_eq!(edge.get("PTCI"), Some(&Value::Undefined));
    }

    #[test]
    fn test_ptci_out_of_range_divergence_errors() {
        let (a, b) = nodes_with_expression();
        let mut metric = Metric::new(MetricKind::Ptci);
        let mut edge = bare_edge().with_data(
            DIVERGENCE,
            Value::Divergence { d: 99.0, d_min: 0.0, d_max: 10.0 },
        );

        assert!(metric.measure_relation(&mut edge, &a, &b).is_err());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut set = MetricSet::new();
        set.register(Metric::new(MetricKind::Ptci)).unwrap();
        assert!(set.register(Metric::new(MetricKind::Ptci)).is_err());
    }

    #[test]
    fn test_vote_types_in_registration_order() {
        let set = MetricSet::default_panel();
        assert_eq!(
            set.vote_types(),
            vec!["expression_vector_similarity", "tfbs_vector_similarity", "PTCI"]
        );
    }

    #[test]
    fn test_mean_and_median_above() {
        let mut metric = Metric::new(MetricKind::ExpressionSimilarity);
        metric.recorded_values = vec![-0.5, 0.2, 0.4, 0.9];
        assert!((metric.mean_above(0.0).unwrap() - 0.5).abs() < 1e-12);
        assert!((metric.median_above(0.0).unwrap() - 0.4).abs() < 1e-12);
        assert!(metric.mean_above(1.0).is_none());
    }
}
