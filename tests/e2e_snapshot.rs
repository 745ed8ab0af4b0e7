//! Build once, snapshot, and run the ranking phase from the restored
//! graph. This is the two-process workflow: an expensive build job writes
//! the snapshot, later ranking jobs start from it.

use pretty_assertions::assert_eq;

use orthorank::metrics::EXPRESSION_VECTOR;
use orthorank::persist::{load_snapshot, save_snapshot};
use orthorank::score::{
    population_prior, rank_candidates, record_bayesian_scores, record_combo_scores,
};
use orthorank::vote::{install_target, take_votes};
use orthorank::{DivergenceMap, GeneGraph, MetricSet, OrthoGroupRegistrar, OrthoGroupTable, Parser};

fn measured_build() -> (GeneGraph, MetricSet) {
    let table = OrthoGroupTable::new(
        vec!["sp1".into(), "sp2".into()],
        vec![
            vec!["a1".into(), "b1".into()],
            vec!["a2".into(), "b2".into()],
            vec!["a3".into(), "b3".into()],
        ],
    )
    .unwrap();
    let div = DivergenceMap::from_triples(vec![("sp1", "sp2", 20.0)]).unwrap();

    let mut graph = GeneGraph::new();
    OrthoGroupRegistrar { table: &table, divergence: Some(&div) }.register(&mut graph).unwrap();

    let profiles = [
        ("a1", vec![1.0, 2.0, 3.0, 4.0]),
        ("b1", vec![1.2, 1.9, 3.1, 4.0]),
        ("a2", vec![4.0, 3.0, 2.0, 1.0]),
        ("b2", vec![3.9, 3.1, 1.8, 1.1]),
        ("a3", vec![2.0, 4.0, 1.0, 3.0]),
        ("b3", vec![2.1, 3.8, 1.2, 2.9]),
    ];
    for (name, profile) in profiles {
        graph.node_mut(name).unwrap().set_feature(EXPRESSION_VECTOR, profile);
    }

    let mut metrics = MetricSet::default_panel();
    metrics.measure_relations(&mut graph).unwrap();
    (graph, metrics)
}

#[test]
fn ranking_from_a_restored_snapshot_matches_direct_ranking() {
    let (graph, metrics) = measured_build();

    let mut buf = Vec::new();
    save_snapshot(&graph, &metrics, &mut buf).unwrap();
    let (restored_graph, restored_metrics) = load_snapshot(&mut buf.as_slice()).unwrap();

    assert_eq!(restored_graph.node_count(), graph.node_count());
    assert_eq!(restored_graph.edge_count(), graph.edge_count());
    assert_eq!(restored_metrics.vote_types(), metrics.vote_types());

    let candidates: Vec<String> = ["b1", "a2", "b2", "a3", "b3"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rank = |mut graph: GeneGraph, mut metrics: MetricSet| {
        install_target(&mut graph, &mut metrics, "a1").unwrap();
        take_votes(&mut graph, &metrics, &candidates, &metrics.vote_types(), None).unwrap();
        record_combo_scores(&mut graph, &candidates).unwrap();
        let prior = population_prior(&graph, &candidates).unwrap();
        record_bayesian_scores(&mut graph, &candidates, prior).unwrap();
        rank_candidates(&graph, &candidates).unwrap()
    };

    let direct = rank(graph, metrics);
    let from_snapshot = rank(restored_graph, restored_metrics);
    assert_eq!(direct, from_snapshot);
}

#[test]
fn snapshot_preserves_measured_edge_values() {
    let (graph, metrics) = measured_build();

    let mut buf = Vec::new();
    save_snapshot(&graph, &metrics, &mut buf).unwrap();
    let (restored, _) = load_snapshot(&mut buf.as_slice()).unwrap();

    for key in graph.edge_keys() {
        let before = graph.edge_between(key.a(), key.b()).unwrap();
        let after = restored.edge_between(key.a(), key.b()).unwrap();
        assert_eq!(
            before.get("expression_vector_similarity"),
            after.get("expression_vector_similarity")
        );
        assert_eq!(before.get("PTCI"), after.get("PTCI"));
    }
}
