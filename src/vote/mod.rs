//! Target injection and neighbor-weighted voting.
//!
//! The ranking phase clones a reference node into a transient "target",
//! wires it to every other node, then polls each candidate's neighborhood:
//! every non-target neighbor votes with its own edge-to-target metric
//! values, weighted by its relation to the candidate.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::graph::GeneGraph;
use crate::metrics::MetricSet;
use crate::model::{Edge, EdgeKey, Value, TARGET_NAME};
use crate::{Error, Result};

/// Clone the node named `reference` as the target and wire it to every
/// other node in the graph.
///
/// Only voting-eligible metrics are measured on the new target edges. The
/// target node itself is registered last, after all its edges exist, so a
/// target–target self-edge can never be created.
pub fn install_target(graph: &mut GeneGraph, metrics: &mut MetricSet, reference: &str) -> Result<()> {
    if graph.target_name().is_some() {
        return Err(Error::Configuration("a target is already installed".into()));
    }

    let target = graph.node(reference)?.clone_as_target();
    let names = graph.node_names();

    for name in &names {
        let mut edge = Edge::new(EdgeKey::new(TARGET_NAME, name)?);
        let node = graph.node(name)?;
        metrics.measure_edge_for_voting(&mut edge, &target, node)?;
        graph.add_edge(edge);
    }

    graph.add_node(target);
    graph.set_target(TARGET_NAME.to_owned());
    info!(reference, edges = names.len(), "target installed");
    Ok(())
}

/// Poll each candidate's neighborhood against the target.
///
/// For every non-target neighbor of a candidate, the neighbor's
/// edge-to-target value for each vote metric is one vote; undefined values
/// are skipped. With `weight_by` set, a vote's weight is the candidate↔
/// neighbor edge's value for that attribute plus one (the +1 offset keeps
/// a raw weight of zero from erasing a valid vote); neighbors whose edge
/// lacks the attribute do not vote. Without `weight_by` every weight is 1.
///
/// The per-metric aggregate is the sum of `value × weight` over all valid
/// votes — it is not divided by the summed weights (legacy scoring
/// contract, kept for compatibility). Zero valid votes leave the
/// aggregate `Undefined`.
pub fn take_votes(
    graph: &mut GeneGraph,
    metrics: &MetricSet,
    candidates: &[String],
    vote_types: &[String],
    weight_by: Option<&str>,
) -> Result<()> {
    if candidates.is_empty() {
        return Err(Error::Configuration("candidate list is empty".into()));
    }
    for vote_type in vote_types {
        if !metrics.contains(vote_type) {
            return Err(Error::Configuration(format!(
                "vote metric '{vote_type}' is not registered"
            )));
        }
    }
    let target = graph
        .target_name()
        .ok_or_else(|| Error::Configuration("no target installed".into()))?
        .to_owned();

    for candidate in candidates {
        graph.node(candidate)?;

        let mut polls: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
        let mut voters: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for vote_type in vote_types {
            polls.insert(vote_type, Vec::new());
            voters.insert(vote_type, Vec::new());
        }

        for neighbor in graph.neighbors(candidate) {
            if neighbor == target {
                continue;
            }
            let Some(to_target) = graph.edge_between(&neighbor, &target) else {
                continue;
            };

            let weight = match weight_by {
                Some(attr) => {
                    let raw = graph
                        .edge_between(candidate, &neighbor)
                        .and_then(|e| e.get(attr))
                        .and_then(Value::as_float);
                    match raw {
                        Some(w) => w + 1.0,
                        None => continue,
                    }
                }
                None => 1.0,
            };

            for vote_type in vote_types {
                if let Some(value) = to_target.get(vote_type).and_then(Value::as_float) {
                    if let Some(poll) = polls.get_mut(vote_type.as_str()) {
                        poll.push((value, weight));
                    }
                    if let Some(names) = voters.get_mut(vote_type.as_str()) {
                        names.push(neighbor.clone());
                    }
                }
            }
        }

        let node = graph.node_mut(candidate)?;
        node.poll_results.clear();
        node.voters_per_metric.clear();
        for (vote_type, votes) in polls {
            node.poll_results.insert(vote_type.to_owned(), weighted_sum(&votes));
        }
        for (vote_type, names) in voters {
            node.voters_per_metric.insert(vote_type.to_owned(), names);
        }
        debug!(candidate, votes = graph.node(candidate)?.total_votes(), "candidate polled");
    }

    Ok(())
}

/// Weight-scaled sum of votes; `Undefined` when no valid vote exists.
fn weighted_sum(votes: &[(f64, f64)]) -> Value {
    if votes.is_empty() {
        return Value::Undefined;
    }
    Value::Float(votes.iter().map(|(v, w)| v * w).sum())
}
