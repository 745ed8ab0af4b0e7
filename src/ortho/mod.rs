//! Ortholog-group tables, divergence lookup, and edge registration.
//!
//! An ortholog-group table has one column per species and one gene per
//! cell; every pair within a row gets an edge. This registration path is
//! shared between real builds and the shuffled rebuilds of the
//! null-distribution generator, so both produce structurally identical
//! edge sets.

use hashbrown::{HashMap, HashSet};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::build::Parser;
use crate::graph::GeneGraph;
use crate::metrics::DIVERGENCE;
use crate::model::{Edge, EdgeKey, Node, Value};
use crate::{Error, Result};

/// Edge-data key marking an assumed orthology relation.
pub const ONE_TO_ONE_ORTHOLOG: &str = "one_to_one_ortholog";

// ============================================================================
// Divergence lookup
// ============================================================================

/// Symmetric species×species divergence-time map with the dataset-wide
/// min/max used by the PTCI weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivergenceMap {
    times: HashMap<String, f64>,
    pub d_min: f64,
    pub d_max: f64,
}

impl DivergenceMap {
    /// Build from `(species_a, species_b, divergence_time)` triples.
    pub fn from_triples<'a, I>(triples: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str, f64)>,
    {
        let mut times = HashMap::new();
        let mut d_min = f64::INFINITY;
        let mut d_max = f64::NEG_INFINITY;
        for (a, b, t) in triples {
            times.insert(Self::key(a, b), t);
            d_min = d_min.min(t);
            d_max = d_max.max(t);
        }
        if times.is_empty() {
            return Err(Error::Configuration("divergence map has no entries".into()));
        }
        Ok(Self { times, d_min, d_max })
    }

    fn key(a: &str, b: &str) -> String {
        if a <= b { format!("{a}\t{b}") } else { format!("{b}\t{a}") }
    }

    pub fn lookup(&self, species_a: &str, species_b: &str) -> Option<f64> {
        self.times.get(&Self::key(species_a, species_b)).copied()
    }

    /// The `(d, d_min, d_max)` triple stored on edges for the PTCI weight.
    pub fn triple(&self, species_a: &str, species_b: &str) -> Option<Value> {
        let d = self.lookup(species_a, species_b)?;
        Some(Value::Divergence { d, d_min: self.d_min, d_max: self.d_max })
    }
}

// ============================================================================
// Ortholog-group table
// ============================================================================

/// One gene per species per row. Rows are synthetic "ortholog groups":
/// every within-row pair is wired with an edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrthoGroupTable {
    pub species: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl OrthoGroupTable {
    pub fn new(species: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let table = Self { species, rows };
        table.validate()?;
        Ok(table)
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Every row must match the species header, and no gene may belong to
    /// more than one group.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for row in &self.rows {
            if row.len() != self.species.len() {
                return Err(Error::Configuration(format!(
                    "ortholog row has {} genes for {} species",
                    row.len(),
                    self.species.len()
                )));
            }
            for gene in row {
                if !seen.insert(gene.as_str()) {
                    return Err(Error::DataIntegrity(format!(
                        "gene '{gene}' occurs in more than one ortholog group"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Independently permute each species column, preserving group shape
    /// (one gene per species per row) while destroying true orthology.
    pub fn shuffle_columns<R: Rng>(&mut self, rng: &mut R) {
        for col in 0..self.species.len() {
            let mut column: Vec<String> = self.rows.iter().map(|r| r[col].clone()).collect();
            column.shuffle(rng);
            for (row, gene) in self.rows.iter_mut().zip(column) {
                row[col] = gene;
            }
        }
    }
}

// ============================================================================
// Registrar — the shared edge-creation path
// ============================================================================

/// Registers an ortholog-group table into the graph: nodes for unseen
/// genes, and an edge per within-row pair carrying the orthology flag and
/// the species-pair divergence triple.
pub struct OrthoGroupRegistrar<'a> {
    pub table: &'a OrthoGroupTable,
    pub divergence: Option<&'a DivergenceMap>,
}

impl OrthoGroupRegistrar<'_> {
    fn register_row(&self, row: &[String], graph: &mut GeneGraph) -> Result<()> {
        for (species, gene) in self.table.species.iter().zip(row) {
            if !graph.has_node(gene) {
                graph.add_node(Node::new(gene, Some(species)));
            }
        }

        for i in 0..row.len() {
            for j in (i + 1)..row.len() {
                let mut edge = Edge::new(EdgeKey::new(&row[i], &row[j])?)
                    .with_data(ONE_TO_ONE_ORTHOLOG, true);
                if let Some(div) = self.divergence {
                    if let Some(triple) =
                        div.triple(&self.table.species[i], &self.table.species[j])
                    {
                        edge.set_data(DIVERGENCE, triple);
                    }
                }
                graph.add_edge(edge);
            }
        }
        Ok(())
    }
}

impl Parser for OrthoGroupRegistrar<'_> {
    fn register(&self, graph: &mut GeneGraph) -> Result<()> {
        self.table.validate()?;
        for row in self.table.rows() {
            self.register_row(row, graph)?;
        }
        Ok(())
    }

    fn describe(&self) -> &str {
        "ortholog-group registrar"
    }
}
