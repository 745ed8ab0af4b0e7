//! Consensus scoring: combo score, Bayesian shrinkage, and ranking.
//!
//! A candidate's evidence is its poll results plus its own direct
//! edge-to-target values. The combo score is their plain mean; the
//! Bayesian score shrinks low-vote candidates toward the population
//! prior, so a gene with two lucky votes cannot outrank one with twenty
//! consistent ones.

use std::collections::BTreeMap;
use std::io::Write;

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics};
use tracing::info;

use crate::graph::GeneGraph;
use crate::model::Value;
use crate::{Error, Result};

// ============================================================================
// Sub-scores and combo score
// ============================================================================

/// A candidate's valid evidence values: every defined poll result plus the
/// candidate's own direct edge-to-target value for the same metric names,
/// in sorted metric order.
pub fn sub_scores(graph: &GeneGraph, name: &str) -> Result<Vec<f64>> {
    let node = graph.node(name)?;
    let target = graph.target_name();

    let mut metric_names: Vec<&String> = node.poll_results.keys().collect();
    metric_names.sort();

    let mut scores = Vec::new();
    for metric in metric_names {
        if let Some(v) = node.poll_results.get(metric).and_then(Value::as_float) {
            scores.push(v);
        }
        if let Some(target) = target {
            if let Some(v) = graph
                .edge_between(name, target)
                .and_then(|e| e.get(metric))
                .and_then(Value::as_float)
            {
                scores.push(v);
            }
        }
    }
    Ok(scores)
}

/// Compute and store each candidate's combo score (mean of its sub-scores;
/// `None` when no defined evidence exists).
pub fn record_combo_scores(graph: &mut GeneGraph, candidates: &[String]) -> Result<()> {
    for name in candidates {
        let scores = sub_scores(graph, name)?;
        let combo = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };
        graph.node_mut(name)?.combo_score = combo;
    }
    Ok(())
}

// ============================================================================
// Population prior and Bayesian shrinkage
// ============================================================================

/// Population-level shrinkage constants, computed once over the candidates
/// that received at least one vote and passed explicitly into scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationPrior {
    /// Median vote count (the dampening factor `c`).
    pub c: f64,
    /// Median combo score (the prior `m`).
    pub m: f64,
}

/// Derive the shrinkage constants from the candidate population.
/// Requires combo scores to be recorded first.
pub fn population_prior(graph: &GeneGraph, candidates: &[String]) -> Result<PopulationPrior> {
    let mut vote_counts = Vec::new();
    let mut combo_scores = Vec::new();
    for name in candidates {
        let node = graph.node(name)?;
        let votes = node.total_votes();
        if votes > 0 {
            vote_counts.push(votes as f64);
            if let Some(combo) = node.combo_score {
                combo_scores.push(combo);
            }
        }
    }
    if vote_counts.is_empty() || combo_scores.is_empty() {
        return Err(Error::Configuration(
            "no candidate received any votes; population prior is undefined".into(),
        ));
    }
    Ok(PopulationPrior {
        c: Data::new(vote_counts).median(),
        m: Data::new(combo_scores).median(),
    })
}

/// Shrinkage estimator: `(c·m + Σscores) / (len(scores) + c)`.
///
/// With no evidence this reduces exactly to the prior `m`; with much
/// evidence it converges to the evidence mean. A non-finite result means
/// the population itself is misconfigured and surfaces as a domain error.
pub fn bayesian_score(prior: PopulationPrior, scores: &[f64]) -> Result<f64> {
    let bs = (prior.c * prior.m + scores.iter().sum::<f64>()) / (scores.len() as f64 + prior.c);
    if !bs.is_finite() {
        return Err(Error::Domain(format!(
            "bayesian score is not finite (c = {}, m = {}, n = {})",
            prior.c,
            prior.m,
            scores.len()
        )));
    }
    Ok(bs)
}

/// Compute and store each candidate's Bayesian score.
pub fn record_bayesian_scores(
    graph: &mut GeneGraph,
    candidates: &[String],
    prior: PopulationPrior,
) -> Result<()> {
    for name in candidates {
        let scores = sub_scores(graph, name)?;
        let bs = bayesian_score(prior, &scores)?;
        graph.node_mut(name)?.bayesian_score = Some(bs);
    }
    Ok(())
}

// ============================================================================
// Ranking
// ============================================================================

/// One row of the final ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedGene {
    pub name: String,
    /// 1-based rank, best first.
    pub rank: usize,
    pub bayesian_score: f64,
    pub combo_score: Option<f64>,
    pub total_votes: usize,
    /// Standard-score distance of the Bayesian score from the population
    /// median Bayesian score.
    pub z_dist: f64,
}

/// Sort candidates by Bayesian score, best first. Scores must have been
/// recorded for every candidate.
pub fn rank_candidates(graph: &GeneGraph, candidates: &[String]) -> Result<Vec<RankedGene>> {
    let mut rows = Vec::with_capacity(candidates.len());
    for name in candidates {
        let node = graph.node(name)?;
        let bs = node.bayesian_score.ok_or_else(|| {
            Error::Configuration(format!("candidate '{name}' has no recorded bayesian score"))
        })?;
        rows.push((name.clone(), bs, node.combo_score, node.total_votes()));
    }

    let b_scores: Vec<f64> = rows.iter().map(|r| r.1).collect();
    let median = Data::new(b_scores.clone()).median();
    let mean = b_scores.iter().sum::<f64>() / b_scores.len() as f64;
    let std_dev = (b_scores.iter().map(|b| (b - mean).powi(2)).sum::<f64>()
        / b_scores.len() as f64)
        .sqrt();

    rows.sort_by(|a, b| b.1.total_cmp(&a.1));

    let ranked = rows
        .into_iter()
        .enumerate()
        .map(|(i, (name, bs, combo, votes))| RankedGene {
            name,
            rank: i + 1,
            bayesian_score: bs,
            combo_score: combo,
            total_votes: votes,
            z_dist: if std_dev == 0.0 { 0.0 } else { (bs - median) / std_dev },
        })
        .collect();
    info!(candidates = candidates.len(), "ranking complete");
    Ok(ranked)
}

/// Write the ranking as a TSV table. Column layout is stable output
/// contract for downstream consumers.
pub fn write_ranking_table(ranked: &[RankedGene], out: &mut dyn Write) -> Result<()> {
    writeln!(out, "node\trank\tb_score\tnaive_score\tvotes\tstd_dev_from_median_b_score")?;
    for row in ranked {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.name,
            row.rank,
            row.bayesian_score,
            row.combo_score.map_or_else(|| "undefined".to_owned(), |c| c.to_string()),
            row.total_votes,
            row.z_dist,
        )?;
    }
    Ok(())
}

// ============================================================================
// Population summaries
// ============================================================================

/// Per-metric poll values and vote counts across a candidate list, for
/// external distribution summaries.
pub fn gather_metric_stats(
    graph: &GeneGraph,
    candidates: &[String],
) -> Result<(BTreeMap<String, Vec<f64>>, BTreeMap<String, Vec<usize>>)> {
    let mut metric_scores: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut metric_votes: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    for name in candidates {
        let node = graph.node(name)?;
        for (metric, value) in &node.poll_results {
            if let Some(v) = value.as_float() {
                metric_scores.entry(metric.clone()).or_default().push(v);
            }
        }
        for (metric, voters) in &node.voters_per_metric {
            metric_votes.entry(metric.clone()).or_default().push(voters.len());
        }
    }
    Ok((metric_scores, metric_votes))
}
