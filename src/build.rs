//! Graph construction from a pipeline of parsers.
//!
//! The crate does not read files: expression tables, TFBS tables, phylo
//! trees, and ortholog lists are parsed by external collaborators that
//! implement [`Parser`] and register nodes/edges into the shared graph.
//! The one registrar the crate ships itself is
//! [`crate::ortho::OrthoGroupRegistrar`], because null-distribution
//! resampling has to rebuild edges through the same path.

use tracing::info;

use crate::graph::GeneGraph;
use crate::{Error, Result};

/// The contract between input parsers and the graph.
///
/// A parser populates/updates nodes by name (typically one feature kind
/// each) and creates/updates edges (typically one relation key each).
/// Re-registration of an existing node or pair merges keys; it never
/// replaces the object.
pub trait Parser {
    fn register(&self, graph: &mut GeneGraph) -> Result<()>;

    /// Human-readable label for logs.
    fn describe(&self) -> &str {
        "parser"
    }
}

/// Runs a list of parsers against a fresh graph. Parsers may borrow the
/// tables they register from.
pub struct GraphBuilder<'a> {
    parsers: Vec<Box<dyn Parser + 'a>>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(parsers: Vec<Box<dyn Parser + 'a>>) -> Self {
        Self { parsers }
    }

    /// Run every parser in order against `graph`.
    pub fn populate(&self, graph: &mut GeneGraph) -> Result<()> {
        if self.parsers.is_empty() {
            return Err(Error::Configuration(
                "graph builder needs at least one parser".into(),
            ));
        }
        for parser in &self.parsers {
            parser.register(graph)?;
            info!(
                parser = parser.describe(),
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                "parser registered"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;

    struct OneNodeParser(&'static str);

    impl Parser for OneNodeParser {
        fn register(&self, graph: &mut GeneGraph) -> Result<()> {
            graph.add_node(Node::new(self.0, Some("sp")));
            Ok(())
        }
    }

    #[test]
    fn test_empty_builder_fails_fast() {
        let builder = GraphBuilder::new(Vec::new());
        let mut graph = GeneGraph::new();
        assert!(builder.populate(&mut graph).is_err());
    }

    #[test]
    fn test_parsers_run_in_order() {
        let builder = GraphBuilder::new(vec![
            Box::new(OneNodeParser("g1")),
            Box::new(OneNodeParser("g2")),
        ]);
        let mut graph = GeneGraph::new();
        builder.populate(&mut graph).unwrap();
        assert_eq!(graph.node_count(), 2);
    }
}
