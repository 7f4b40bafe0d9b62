// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::graph::{Edge, Graph, GraphError, Node};
use crate::model::ids::NodeId;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PruneReport {
    threshold: f64,
    pruned_nodes: Vec<NodeId>,
    pruned_edges: Vec<Edge>,
}

impl PruneReport {
    /// Inclusive time a node had to exceed to stay.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn pruned_nodes(&self) -> &[NodeId] {
        &self.pruned_nodes
    }

    pub fn pruned_edges(&self) -> &[Edge] {
        &self.pruned_edges
    }
}

fn recorded_inclusive(node: &Node) -> Option<f64> {
    node.per_dataset()
        .values()
        .map(|record| record.inclusive)
        .filter(|value| value.is_finite())
        .reduce(f64::max)
}

/// Drops every node whose inclusive time is not above `percent`% of the largest one,
/// along with the edges touching it.
///
/// A node's inclusive time is the largest scalar `inclusive` across its datasets; a node
/// without metrics falls back to the larger of its incoming and outgoing edge flow. When
/// no node has positive time nothing is pruned.
pub fn prune_by_inclusive(graph: &mut Graph, percent: f64) -> Result<PruneReport, GraphError> {
    let mut flows = BTreeMap::<&NodeId, (f64, f64)>::new();
    for edge in graph.edges() {
        flows.entry(edge.target()).or_default().0 += edge.weight();
        flows.entry(edge.source()).or_default().1 += edge.weight();
    }

    let times = graph
        .nodes()
        .values()
        .map(|node| {
            let time = recorded_inclusive(node).unwrap_or_else(|| {
                let (in_flow, out_flow) = flows.get(node.id()).copied().unwrap_or_default();
                in_flow.max(out_flow)
            });
            (node.id().clone(), time)
        })
        .collect::<Vec<_>>();

    let max_time = times.iter().map(|(_, time)| *time).fold(0.0f64, f64::max);
    if max_time <= 0.0 {
        return Ok(PruneReport::default());
    }

    let threshold = percent / 100.0 * max_time;
    let pruned = times
        .into_iter()
        .filter(|(_, time)| *time <= threshold)
        .map(|(node_id, _)| node_id)
        .collect::<BTreeSet<_>>();
    let pruned_edges = graph.remove_nodes(&pruned)?;

    tracing::debug!(
        percent,
        threshold,
        nodes = pruned.len(),
        edges = pruned_edges.len(),
        "pruned call sites below the inclusive threshold"
    );

    Ok(PruneReport { threshold, pruned_nodes: pruned.into_iter().collect(), pruned_edges })
}
