//! Snapshot persistence between the build and ranking phases.
//!
//! Graph construction over real datasets is the expensive phase; ranking
//! is cheap and often repeated with different references. A snapshot
//! captures the measured graph together with its metric registry (voting
//! eligibility and recorded distributions included) so ranking runs can
//! start from the finished build.

use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::graph::GeneGraph;
use crate::metrics::MetricSet;
use crate::Result;

/// On-disk snapshot envelope. The timestamp records when the build phase
/// finished, not when the file was written.
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub created: DateTime<Utc>,
    pub graph: GeneGraph,
    pub metrics: MetricSet,
}

/// Serialize the measured graph and its metric registry as JSON.
pub fn save_snapshot(graph: &GeneGraph, metrics: &MetricSet, out: &mut dyn Write) -> Result<()> {
    let snapshot = GraphSnapshot {
        created: Utc::now(),
        graph: graph.clone(),
        metrics: metrics.clone(),
    };
    serde_json::to_writer(&mut *out, &snapshot)?;
    out.flush()?;
    info!(
        nodes = snapshot.graph.node_count(),
        edges = snapshot.graph.edge_count(),
        "snapshot written"
    );
    Ok(())
}

/// Restore a graph and metric registry from a snapshot stream.
pub fn load_snapshot(input: &mut dyn Read) -> Result<(GeneGraph, MetricSet)> {
    let snapshot: GraphSnapshot = serde_json::from_reader(input)?;
    info!(
        created = %snapshot.created,
        nodes = snapshot.graph.node_count(),
        edges = snapshot.graph.edge_count(),
        "snapshot loaded"
    );
    Ok((snapshot.graph, snapshot.metrics))
}
