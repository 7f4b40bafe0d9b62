// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::model::graph::{Edge, EdgeEndpoint, EdgeKind, Graph, GraphError, Node};
use crate::model::ids::NodeId;

/// An edge that could not be routed because an endpoint has no level.
///
/// Not fatal: the edge is left as-is and the rest of the graph is routed.
#[derive(Debug, Clone, PartialEq)]
pub struct DisconnectedEdgeWarning {
    pub source: NodeId,
    pub target: NodeId,
    pub unleveled: EdgeEndpoint,
    pub weight: f64,
}

impl fmt::Display for DisconnectedEdgeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node_id = match self.unleveled {
            EdgeEndpoint::Source => &self.source,
            EdgeEndpoint::Target => &self.target,
        };
        write!(
            f,
            "edge {} -> {} skipped: {} node {node_id} has no level",
            self.source,
            self.target,
            self.unleveled.as_str()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteReport {
    intermediate_nodes: Vec<NodeId>,
    routed_edges: usize,
    non_forward_edges: usize,
    warnings: Vec<DisconnectedEdgeWarning>,
}

impl RouteReport {
    /// Ids of the intermediate nodes created, in creation order.
    pub fn intermediate_nodes(&self) -> &[NodeId] {
        &self.intermediate_nodes
    }

    /// Number of original edges replaced by a chain.
    pub fn routed_edges(&self) -> usize {
        self.routed_edges
    }

    /// Same-level or back-pointing edges that were passed through unchanged.
    pub fn non_forward_edges(&self) -> usize {
        self.non_forward_edges
    }

    pub fn warnings(&self) -> &[DisconnectedEdgeWarning] {
        &self.warnings
    }
}

fn next_intermediate_id(graph: &Graph, target: &NodeId, seq: &mut usize) -> NodeId {
    loop {
        let candidate = format!("intermediate_{target}_{seq}");
        *seq += 1;
        let node_id = NodeId::new(candidate).expect("intermediate ids are non-empty");
        if !graph.contains_node(&node_id) {
            return node_id;
        }
    }
}

/// Replaces every edge spanning more than one level with a chain of one-level hops.
///
/// A chain gets one intermediate node per skipped level. Intermediate nodes are shared per
/// `(target, level)`, so parents converging on the same callee reuse one routing node per
/// layer; each routed edge adds its weight to every intermediate node it passes. Hops are
/// never merged: each hop carries the original edge's `weight` and `exc_weight`, which
/// conserves flow along every chain and makes the flow entering a shared node equal the
/// sum of the edges routed through it.
///
/// Edges with `shift <= 1` (including same-level and back-pointing edges) are left
/// untouched. Edges touching an unleveled node are left untouched and reported.
pub fn route(graph: &mut Graph) -> Result<RouteReport, GraphError> {
    if graph.is_frozen() {
        return Err(GraphError::Frozen);
    }

    let mut report = RouteReport::default();
    let mut shared = BTreeMap::<(NodeId, usize), NodeId>::new();
    let mut expanded = BTreeSet::<usize>::new();
    let mut chains = Vec::<Edge>::new();
    let mut seq = 0usize;

    let originals = graph.edges().to_vec();
    for (idx, edge) in originals.iter().enumerate() {
        let source_level = graph.node(edge.source()).and_then(Node::level);
        let target_level = graph.node(edge.target()).and_then(Node::level);
        let (source_level, target_level) = match (source_level, target_level) {
            (Some(source_level), Some(target_level)) => (source_level, target_level),
            (source_level, _) => {
                let warning = DisconnectedEdgeWarning {
                    source: edge.source().clone(),
                    target: edge.target().clone(),
                    unleveled: if source_level.is_none() {
                        EdgeEndpoint::Source
                    } else {
                        EdgeEndpoint::Target
                    },
                    weight: edge.weight(),
                };
                tracing::warn!(%warning, "disconnected edge");
                report.warnings.push(warning);
                continue;
            }
        };

        if target_level <= source_level {
            report.non_forward_edges += 1;
            continue;
        }
        if target_level == source_level + 1 {
            continue;
        }

        let module = graph.node(edge.target()).and_then(Node::module).map(str::to_owned);
        let mut hop_source = edge.source().clone();
        for level in source_level + 1..target_level {
            let key = (edge.target().clone(), level);
            let hop_target = match shared.get(&key) {
                Some(node_id) => node_id.clone(),
                None => {
                    let node_id = next_intermediate_id(graph, edge.target(), &mut seq);
                    graph.add_node(Node::intermediate(node_id.clone(), module.clone(), level))?;
                    shared.insert(key, node_id.clone());
                    report.intermediate_nodes.push(node_id.clone());
                    node_id
                }
            };
            graph.node_mut(&hop_target).expect("intermediate node exists").add_weight(edge.weight());

            let kind = if level == source_level + 1 {
                EdgeKind::SourceIntermediate
            } else {
                EdgeKind::TargetIntermediate
            };
            chains.push(Edge::routed(hop_source, hop_target.clone(), kind, edge));
            hop_source = hop_target;
        }
        chains.push(Edge::routed(
            hop_source,
            edge.target().clone(),
            EdgeKind::TargetIntermediate,
            edge,
        ));

        expanded.insert(idx);
        report.routed_edges += 1;
    }

    // `remove_edges_matching` visits edges in order, so a running index identifies them.
    let mut position = 0usize;
    graph.remove_edges_matching(|_| {
        let hit = expanded.contains(&position);
        position += 1;
        hit
    })?;
    for edge in chains {
        graph.add_edge(edge)?;
    }

    if report.non_forward_edges > 0 {
        tracing::debug!(
            non_forward = report.non_forward_edges,
            "same-level or backward edges passed through unrouted"
        );
    }
    tracing::debug!(
        routed = report.routed_edges,
        intermediate = report.intermediate_nodes.len(),
        "routed long edges"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::route;
    use crate::layout::levels::assign_levels;
    use crate::model::graph::{Edge, EdgeEndpoint, EdgeKind, Graph, GraphError, Node};
    use crate::model::ids::NodeId;

    fn nid(value: &str) -> NodeId {
        NodeId::new(value).expect("node id")
    }

    fn assert_one_level_span(graph: &Graph) {
        for edge in graph.edges() {
            let source = graph.node(edge.source()).and_then(|n| n.level()).expect("source level");
            let target = graph.node(edge.target()).and_then(|n| n.level()).expect("target level");
            assert_eq!(target, source + 1, "edge {} -> {}", edge.source(), edge.target());
        }
    }

    #[test]
    fn skip_level_edge_becomes_a_three_hop_chain() {
        let mut graph = crate::model::fixtures::skip_level();
        assign_levels(&mut graph);
        let report = route(&mut graph).expect("route");

        assert_eq!(report.intermediate_nodes(), &[nid("intermediate_leaf_0"), nid("intermediate_leaf_1")]);
        assert_eq!(report.routed_edges(), 1);
        assert_eq!(graph.nodes().len(), 5);
        assert_eq!(graph.edges().len(), 4);
        assert_one_level_span(&graph);

        let untouched = graph
            .edges()
            .iter()
            .filter(|e| e.kind() == EdgeKind::Normal)
            .map(|e| (e.source().as_str(), e.target().as_str()))
            .collect::<Vec<_>>();
        assert_eq!(untouched, vec![("root", "mid")]);

        let chain = graph.edges().iter().filter(|e| e.kind().is_synthetic()).collect::<Vec<_>>();
        assert_eq!(chain.len(), 3);
        assert!(chain.iter().all(|e| e.weight() == 10.0));
        assert!(chain.iter().all(|e| e.origin() == Some((&nid("root"), &nid("leaf")))));
        assert_eq!(
            chain.iter().map(|e| e.kind()).collect::<Vec<_>>(),
            vec![
                EdgeKind::SourceIntermediate,
                EdgeKind::TargetIntermediate,
                EdgeKind::TargetIntermediate
            ]
        );
    }

    #[test]
    fn intermediate_nodes_inherit_module_but_no_metrics() {
        let mut graph = crate::model::fixtures::skip_level();
        assign_levels(&mut graph);
        route(&mut graph).expect("route");

        let node = graph.node(&nid("intermediate_leaf_1")).expect("intermediate");
        assert!(node.is_intermediate());
        assert_eq!(node.module(), Some("libm"));
        assert_eq!(node.level(), Some(2));
        assert!(node.per_dataset().is_empty());
    }

    #[test]
    fn converging_edges_share_intermediate_nodes() {
        let mut graph = crate::model::fixtures::converging_long_edges();
        assign_levels(&mut graph);
        let report = route(&mut graph).expect("route");

        assert_eq!(report.routed_edges(), 2);
        assert_eq!(report.intermediate_nodes().len(), 2);
        assert_one_level_span(&graph);

        let shared = nid("intermediate_sink_1");
        assert_eq!(graph.node(&shared).map(|n| n.level()), Some(Some(2)));
        assert_eq!(graph.node(&shared).map(|n| n.weight()), Some(10.0));

        let entering = graph
            .edges()
            .iter()
            .filter(|e| e.target() == &shared)
            .map(|e| e.weight())
            .sum::<f64>();
        assert_eq!(entering, 4.0 + 6.0);

        // Each original edge keeps its own hop into the sink.
        let mut into_sink = graph
            .edges()
            .iter()
            .filter(|e| e.target().as_str() == "sink")
            .map(|e| e.weight())
            .collect::<Vec<_>>();
        into_sink.sort_by(f64::total_cmp);
        assert_eq!(into_sink, vec![4.0, 6.0]);
    }

    #[test]
    fn intermediate_ids_skip_existing_nodes() {
        let mut graph = crate::model::fixtures::skip_level();
        graph.add_node(Node::new(nid("intermediate_leaf_0")).with_level(7)).expect("add");
        assign_levels(&mut graph);
        let report = route(&mut graph).expect("route");
        assert_eq!(report.intermediate_nodes(), &[nid("intermediate_leaf_1"), nid("intermediate_leaf_2")]);
    }

    #[test]
    fn unleveled_edges_are_reported_and_left_alone() {
        let mut graph = crate::model::fixtures::call_tree_small();
        let before = graph.clone();
        let report = route(&mut graph).expect("route");

        assert_eq!(graph, before);
        assert_eq!(report.warnings().len(), 3);
        assert_eq!(report.warnings()[0].unleveled, EdgeEndpoint::Source);
        assert_eq!(
            report.warnings()[0].to_string(),
            "edge main -> solve skipped: source node main has no level"
        );
    }

    #[test]
    fn backward_and_same_level_edges_pass_through() {
        let mut graph = Graph::default();
        graph.add_node(Node::new(nid("a")).with_level(0)).expect("add");
        graph.add_node(Node::new(nid("b")).with_level(2)).expect("add");
        graph.add_node(Node::new(nid("c")).with_level(2)).expect("add");
        graph.add_edge(Edge::new(nid("b"), nid("a"), 1.0)).expect("edge");
        graph.add_edge(Edge::new(nid("b"), nid("c"), 1.0)).expect("edge");

        let before = graph.clone();
        let report = route(&mut graph).expect("route");
        assert_eq!(graph, before);
        assert_eq!(report.non_forward_edges(), 2);
        assert!(report.warnings().is_empty());
    }

    #[test]
    fn routing_twice_is_a_no_op() {
        let mut graph = crate::model::fixtures::converging_long_edges();
        assign_levels(&mut graph);
        route(&mut graph).expect("route");
        let once = graph.clone();

        let report = route(&mut graph).expect("route again");
        assert_eq!(graph, once);
        assert_eq!(report.routed_edges(), 0);
    }

    #[test]
    fn frozen_graphs_cannot_be_routed() {
        let mut graph = crate::model::fixtures::skip_level();
        graph.freeze();
        assert_eq!(route(&mut graph), Err(GraphError::Frozen));
    }
}
