// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

use crate::model::graph::Graph;
use crate::model::ids::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelAssignment {
    max_level: Option<usize>,
    unreached: Vec<NodeId>,
}

impl LevelAssignment {
    /// Highest level in the graph, `None` when no node has a level.
    pub fn max_level(&self) -> Option<usize> {
        self.max_level
    }

    /// Nodes left unleveled: unreachable from any source (only inside a cyclic
    /// remainder) or below a node already at `usize::MAX`.
    pub fn unreached(&self) -> &[NodeId] {
        &self.unreached
    }
}

/// Assigns levels by frontier propagation from the zero-indegree nodes.
///
/// Sources always sit at level 0, overriding any preset level. Each frontier node gives
/// every unvisited successor without a level `level(node) + 1`; successors with a level
/// preset by the input keep it but still join the next frontier so propagation continues
/// through them. A successor whose level would not fit in `usize` stays unleveled.
/// The first assignment wins, which yields shortest-path-from-root levels and keeps the
/// number of layers (and routing nodes) small.
///
/// Levels are only ever filled in, never overwritten, so running this twice on an
/// unmutated graph changes nothing.
pub fn assign_levels(graph: &mut Graph) -> LevelAssignment {
    let adjacency = graph.adjacency();

    let sources = graph
        .nodes()
        .keys()
        .filter(|node_id| adjacency.indegree(node_id) == 0)
        .cloned()
        .collect::<Vec<_>>();

    let mut visited = BTreeSet::<NodeId>::new();
    let mut frontier = Vec::<NodeId>::with_capacity(sources.len());
    for node_id in sources {
        graph.node_mut(&node_id).expect("node exists").set_level(0);
        visited.insert(node_id.clone());
        frontier.push(node_id);
    }

    while !frontier.is_empty() {
        let mut next = Vec::<NodeId>::new();
        for node_id in &frontier {
            let level = graph
                .node(node_id)
                .and_then(|node| node.level())
                .expect("frontier nodes are leveled");

            for &edge_idx in adjacency.outgoing(node_id) {
                let target = graph.edges()[edge_idx].target().clone();
                if !visited.insert(target.clone()) {
                    continue;
                }
                let node = graph.node_mut(&target).expect("node exists (validated)");
                if node.level().is_none() {
                    let Some(child_level) = level.checked_add(1) else {
                        continue;
                    };
                    node.set_level(child_level);
                }
                next.push(target);
            }
        }
        frontier = next;
    }

    let unreached = graph
        .nodes()
        .values()
        .filter(|node| node.level().is_none())
        .map(|node| node.id().clone())
        .collect::<Vec<_>>();
    let max_level = graph.max_level();

    tracing::debug!(?max_level, unreached = unreached.len(), "assigned levels");

    LevelAssignment { max_level, unreached }
}
