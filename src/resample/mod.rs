//! Null-distribution generation by ortholog-column shuffling.
//!
//! Each repetition destroys true orthology (independent per-species column
//! permutation), rebuilds the edge set through the normal registration
//! path, re-measures every metric from a clean slate, and reads back the
//! per-group mean PTCI. The collected means estimate what PTCI values look
//! like between genes with no real evolutionary relationship.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use statrs::statistics::{Data, OrderStatistics};
use tracing::{debug, info};

use crate::build::Parser;
use crate::graph::GeneGraph;
use crate::metrics::{MetricKind, MetricSet};
use crate::model::Value;
use crate::ortho::{DivergenceMap, OrthoGroupRegistrar, OrthoGroupTable};
use crate::Result;

/// Mean metric value per ortholog group, keyed by the group's gene list.
pub type GroupMeans = BTreeMap<Vec<String>, f64>;

/// Tear down every edge, shuffle the table's species columns, and rebuild
/// the edge set through the shared registration path.
///
/// Nodes and their features survive; only the pairing is randomized. The
/// shuffled table is validated before registration so a corrupt shuffle
/// can never silently produce a malformed graph.
pub fn reset_random_edges<R: Rng>(
    graph: &mut GeneGraph,
    table: &mut OrthoGroupTable,
    divergence: Option<&DivergenceMap>,
    rng: &mut R,
) -> Result<()> {
    graph.remove_all_edges();
    table.shuffle_columns(rng);
    table.validate()?;
    OrthoGroupRegistrar { table, divergence }.register(graph)?;
    Ok(())
}

/// Mean of the defined `metric` edge values inside each of the table's
/// ortholog groups. Groups whose edges carry no defined value are omitted.
pub fn ortho_group_means(
    graph: &GeneGraph,
    table: &OrthoGroupTable,
    metric: &str,
) -> Result<GroupMeans> {
    let mut means = GroupMeans::new();
    for row in table.rows() {
        let mut values = Vec::new();
        for i in 0..row.len() {
            for j in (i + 1)..row.len() {
                if let Some(v) = graph
                    .edge_between(&row[i], &row[j])
                    .and_then(|e| e.get(metric))
                    .and_then(Value::as_float)
                {
                    values.push(v);
                }
            }
        }
        if !values.is_empty() {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            means.insert(row.clone(), mean);
        }
    }
    Ok(means)
}

/// Run `reps` shuffled rebuild-and-measure repetitions, collecting the
/// per-group mean PTCI of each.
///
/// The graph is left in its last shuffled state; callers doing a real run
/// afterwards must rebuild from the original table. Raising `cancel`
/// stops before the next repetition and returns the repetitions finished
/// so far, so long runs remain interruptible without losing their work.
pub fn generate_null<R: Rng>(
    graph: &mut GeneGraph,
    metrics: &mut MetricSet,
    table: &OrthoGroupTable,
    divergence: Option<&DivergenceMap>,
    reps: usize,
    rng: &mut R,
    cancel: &AtomicBool,
) -> Result<Vec<GroupMeans>> {
    let ptci = MetricKind::Ptci.name();
    let mut runs = Vec::with_capacity(reps);

    for rep in 0..reps {
        if cancel.load(Ordering::Relaxed) {
            info!(finished = runs.len(), requested = reps, "null generation cancelled");
            break;
        }

        let mut shuffled = table.clone();
        reset_random_edges(graph, &mut shuffled, divergence, rng)?;

        metrics.clear_recorded();
        metrics.measure_relations(graph)?;
        metrics.standardize_metric(graph, ptci)?;

        let means = ortho_group_means(graph, &shuffled, ptci)?;
        debug!(rep, groups = means.len(), "null repetition finished");
        runs.push(means);
    }

    info!(reps = runs.len(), "null distribution collected");
    Ok(runs)
}

/// Percentile cutoff (0..=100) over every group mean in every repetition.
/// `None` when the null runs produced no defined means at all.
pub fn null_cutoff(runs: &[GroupMeans], percentile: u64) -> Option<f64> {
    let values: Vec<f64> = runs.iter().flat_map(|m| m.values().copied()).collect();
    if values.is_empty() {
        return None;
    }
    Some(Data::new(values).percentile(percentile as usize))
}

/// Groups from a real run whose mean exceeds the given percentile of the
/// null distribution. An empty null sample admits nothing.
pub fn top_groups(real: &GroupMeans, null_runs: &[GroupMeans], percentile: u64) -> GroupMeans {
    let Some(cutoff) = null_cutoff(null_runs, percentile) else {
        return GroupMeans::new();
    };
    real.iter()
        .filter(|(_, mean)| **mean > cutoff)
        .map(|(group, mean)| (group.clone(), *mean))
        .collect()
}
