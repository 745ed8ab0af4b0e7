//! # orthorank — Cross-Species Gene Relation Graph & Consensus Ranking
//!
//! An attributed undirected graph over genes, with pluggable per-edge
//! similarity/divergence metrics and a neighbor-voting consensus engine
//! used to rank a species' gene set against a chosen reference profile.
//!
//! ## Design Principles
//!
//! 1. **Explicit context**: `GeneGraph` is the single mutable state passed
//!    between phases (build → measure → inject target → vote → score)
//! 2. **Clean DTOs**: `Node`, `Edge`, `Value` cross all boundaries
//! 3. **Undefined is a value**: a metric that cannot be computed yields
//!    `Value::Undefined`, which aggregation excludes — it is never an error
//! 4. **Closed metric set**: metrics are a fixed enumeration, not an open
//!    subclass hierarchy; each has a distinct numeric contract
//!
//! ## Quick Start
//!
//! ```rust
//! use orthorank::{GeneGraph, MetricSet, Node, Value};
//!
//! # fn example() -> orthorank::Result<()> {
//! let mut graph = GeneGraph::new();
//! let mut node = Node::new("AGAP001234", Some("Anopheles gambiae"));
//! node.set_feature("expression_vector", Value::FloatVec(vec![1.0, 4.0, 2.5]));
//! graph.add_node(node);
//! // ... register more nodes and ortholog edges, then:
//! let mut metrics = MetricSet::default_panel();
//! metrics.measure_relations(&mut graph)?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Pipeline Phases
//!
//! | Phase | Entry point | Reads | Writes |
//! |-------|-------------|-------|--------|
//! | Build | [`build::GraphBuilder`] | input tables | nodes, edges |
//! | Measure | [`MetricSet::measure_relations`] | node features | edge data, metric stats |
//! | Inject | [`vote::install_target`] | reference node | target node + edges |
//! | Vote | [`vote::take_votes`] | neighbor→target edges | poll results, voters |
//! | Score | [`score`] functions | polls + target edges | combo/bayesian scores |
//! | Null | [`resample::generate_null`] | ortholog table | shuffled edges, samples |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod graph;
pub mod metrics;
pub mod build;
pub mod ortho;
pub mod vote;
pub mod score;
pub mod resample;
pub mod persist;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{Node, Edge, EdgeKey, Value, FeatureMap, TARGET_NAME};

// ============================================================================
// Re-exports: Graph & metrics
// ============================================================================

pub use graph::GeneGraph;
pub use metrics::{Metric, MetricKind, MetricSet};

// ============================================================================
// Re-exports: Collaborator seams
// ============================================================================

pub use build::{GraphBuilder, Parser};
pub use ortho::{DivergenceMap, OrthoGroupRegistrar, OrthoGroupTable};
pub use score::{PopulationPrior, RankedGene};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid numeric input to a deterministic formula (divergence outside
    /// its declared range, shrinkage score computing to NaN). Fatal to the
    /// current computation — never silently replaced by a fallback value.
    #[error("Domain error: {0}")]
    Domain(String),

    /// Bad request shape: unknown metric name, empty candidate list,
    /// duplicate metric registration. Fails fast before any computation.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An ortholog-group table assigns the same gene to more than one group.
    /// Aborts the current resampling repetition.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
