//! Integration tests for lowest-common-ancestor search over version graphs.

use oxide_qom::graph::{GraphError, NodeId, VersionGraph};

/// Builds a history with two merges:
///
/// ```text
/// init - a1 - a2 ------- m1 - m2
///    \              /         /
///     b1 - b2 - b3 ---- c1 --+
/// ```
fn history() -> (VersionGraph, Vec<NodeId>) {
    let mut graph = VersionGraph::new();
    let init = graph.add("init", "initial schema", &[]).unwrap();
    let a1 = graph.add("a1", "add orders", &[init]).unwrap();
    let a2 = graph.add("a2", "index orders", &[a1]).unwrap();
    let b1 = graph.add("b1", "add customers", &[init]).unwrap();
    let b2 = graph.add("b2", "rename column", &[b1]).unwrap();
    let b3 = graph.add("b3", "drop column", &[b2]).unwrap();
    let m1 = graph.add("m1", "merge", &[a2, b3]).unwrap();
    let c1 = graph.add("c1", "add view", &[b3]).unwrap();
    let m2 = graph.add("m2", "merge", &[m1, c1]).unwrap();
    let nodes = vec![init, a1, a2, b1, b2, b3, m1, c1, m2];
    (graph, nodes)
}

#[test]
fn test_common_ancestor_is_reflexive() {
    let (graph, nodes) = history();
    for node in nodes {
        assert_eq!(graph.common_ancestor(node, node), Ok(node));
    }
}

#[test]
fn test_common_ancestor_is_symmetric() {
    let (graph, nodes) = history();
    for &a in &nodes {
        for &b in &nodes {
            assert_eq!(
                graph.common_ancestor(a, b),
                graph.common_ancestor(b, a),
                "{} / {}",
                graph.node(a).unwrap().id(),
                graph.node(b).unwrap().id()
            );
        }
    }
}

#[test]
fn test_common_ancestor_prefers_the_closest_shared_version() {
    let (graph, _) = history();
    let id = |name: &str| graph.find(name).unwrap();

    assert_eq!(graph.common_ancestor(id("a2"), id("b3")), Ok(id("init")));
    assert_eq!(graph.common_ancestor(id("m1"), id("c1")), Ok(id("b3")));
    assert_eq!(graph.common_ancestor(id("m2"), id("a1")), Ok(id("a1")));
    assert_eq!(graph.common_ancestor(id("a1"), id("b2")), Ok(id("init")));
}

#[test]
fn test_disjoint_histories_are_unrelated() {
    let mut graph = VersionGraph::new();
    let left_root = graph.add("left-root", "", &[]).unwrap();
    let left = graph.add("left", "", &[left_root]).unwrap();
    let right_root = graph.add("right-root", "", &[]).unwrap();
    let right = graph.add("right", "", &[right_root]).unwrap();

    assert_eq!(
        graph.common_ancestor(left, right),
        Err(GraphError::Unrelated {
            left: String::from("left"),
            right: String::from("right"),
        })
    );
    assert!(matches!(
        graph.common_ancestor(right, left),
        Err(GraphError::Unrelated { .. })
    ));
}

#[test]
fn test_wide_diamond_history_resolves() {
    let mut graph = VersionGraph::new();
    let root = graph.add("root", "", &[]).unwrap();
    let mut tips = vec![root];
    for layer in 0..40 {
        let left = graph
            .add(format!("l{layer}"), "", &[tips[tips.len() - 1]])
            .unwrap();
        let right = graph
            .add(format!("r{layer}"), "", &[tips[tips.len() - 1]])
            .unwrap();
        let merge = graph.add(format!("m{layer}"), "", &[left, right]).unwrap();
        tips.push(merge);
    }
    let side = graph.add("side", "", &[tips[10]]).unwrap();
    let last = tips[tips.len() - 1];

    assert_eq!(graph.common_ancestor(last, side), Ok(tips[10]));
    assert_eq!(graph.ancestors(last).unwrap().len(), graph.len() - 1);
}
