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

/// Sets every node's `inclusive`, `exclusive` and `weight` from its incident edges.
///
/// `inclusive = max(in, out)` and `exclusive = inclusive - out`: a root that passes all
/// its flow on has no exclusive flow, a leaf keeps all of it.
pub fn aggregate(graph: &mut Graph) {
    let mut flows = BTreeMap::<NodeId, (f64, f64)>::new();
    for edge in graph.edges() {
        flows.entry(edge.target().clone()).or_default().0 += edge.weight();
        flows.entry(edge.source().clone()).or_default().1 += edge.weight();
    }

    for node in graph.nodes_mut() {
        let (in_flow, out_flow) = flows.get(node.id()).copied().unwrap_or_default();
        let inclusive = in_flow.max(out_flow);
        node.set_flow(inclusive, inclusive - out_flow);
    }
}
