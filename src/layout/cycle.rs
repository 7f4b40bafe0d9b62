// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use crate::model::graph::Graph;
use crate::model::ids::NodeId;

/// A directed cycle, as the node sequence along the back-edge's path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    nodes: Vec<NodeId>,
}

impl Cycle {
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.nodes.contains(node_id)
    }
}

/// The graph is not a DAG, so no layered layout exists for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclicGraph {
    pub cycle: Cycle,
}

impl std::fmt::Display for CyclicGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cycle.nodes.is_empty() {
            return write!(f, "graph contains a cycle");
        }
        write!(f, "graph contains a cycle involving nodes: ")?;
        for (idx, node_id) in self.cycle.nodes.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{node_id}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CyclicGraph {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Three-color DFS over the graph in node-id order.
///
/// Gray marks nodes on the current path; the first edge that reaches a gray node closes
/// a cycle. The DFS keeps an explicit stack so deep call chains cannot overflow.
pub fn detect_cycle(graph: &Graph) -> Option<Cycle> {
    let adjacency = graph.adjacency();
    let edges = graph.edges();
    let mut color =
        graph.nodes().keys().map(|node_id| (node_id, Color::White)).collect::<BTreeMap<_, _>>();

    for start in graph.nodes().keys() {
        if color.get(start).copied() != Some(Color::White) {
            continue;
        }

        // (node, index of the next outgoing edge to explore)
        let mut stack = vec![(start, 0usize)];
        color.insert(start, Color::Gray);

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let outgoing = adjacency.outgoing(node);
            if frame.1 >= outgoing.len() {
                color.insert(node, Color::Black);
                stack.pop();
                continue;
            }

            let target = edges[outgoing[frame.1]].target();
            frame.1 += 1;

            match color.get(target).copied().unwrap_or(Color::Black) {
                Color::White => {
                    color.insert(target, Color::Gray);
                    stack.push((target, 0));
                }
                Color::Gray => {
                    let start_idx = stack
                        .iter()
                        .position(|(node_id, _)| *node_id == target)
                        .expect("gray node is on the current path");
                    let nodes =
                        stack[start_idx..].iter().map(|(node_id, _)| (*node_id).clone()).collect();
                    return Some(Cycle { nodes });
                }
                Color::Black => {}
            }
        }
    }

    None
}

/// [`detect_cycle`] as a precondition check.
pub fn ensure_acyclic(graph: &Graph) -> Result<(), CyclicGraph> {
    match detect_cycle(graph) {
        Some(cycle) => Err(CyclicGraph { cycle }),
        None => Ok(()),
    }
}
