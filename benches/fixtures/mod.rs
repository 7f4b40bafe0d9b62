// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use std::collections::BTreeMap;

use tributary::model::{
    DatasetId, EdgeRecord, Graph, GraphInput, MetricRecord, NodeId, NodeRecord,
};

pub fn checksum_graph(graph: &Graph) -> u64 {
    let mut acc = 0u64;
    for node in graph.nodes().values() {
        acc = acc.wrapping_mul(131).wrapping_add(node.id().as_str().len() as u64);
        if let Some(placement) = node.placement() {
            acc = acc.wrapping_add(placement.y().to_bits());
            acc = acc.wrapping_add(placement.height().to_bits());
        }
    }
    for edge in graph.edges() {
        acc = acc.wrapping_mul(131).wrapping_add(edge.weight().to_bits());
        if let Some(band) = edge.band() {
            acc = acc.wrapping_add(band.source_y.to_bits() ^ band.target_y.to_bits());
        }
    }
    acc
}

/// Sawtooth samples in `[0, 100)`; stable across runs.
pub fn samples(count: usize, seed: usize) -> Vec<f64> {
    (0..count).map(|idx| ((idx * 37 + seed * 11) % 1000) as f64 / 10.0).collect()
}

pub mod graph {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DagParams {
        pub levels: usize,
        pub nodes_per_level: usize,
        pub fanout: usize,
        pub long_edges_per_node: usize,
        pub datasets: usize,
        pub ranks: usize,
    }

    impl DagParams {
        pub const fn new(
            levels: usize,
            nodes_per_level: usize,
            fanout: usize,
            long_edges_per_node: usize,
            datasets: usize,
            ranks: usize,
        ) -> Self {
            Self { levels, nodes_per_level, fanout, long_edges_per_node, datasets, ranks }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Case {
        Small,
        MediumDense,
        LargeLongEdges,
    }

    impl Case {
        pub const fn id(self) -> &'static str {
            match self {
                Self::Small => "small",
                Self::MediumDense => "medium_dense",
                Self::LargeLongEdges => "large_long_edges",
            }
        }

        pub const fn params(self) -> DagParams {
            match self {
                Self::Small => DagParams::new(6, 10, 2, 0, 2, 16),
                Self::MediumDense => DagParams::new(12, 20, 4, 1, 4, 64),
                Self::LargeLongEdges => DagParams::new(24, 35, 3, 3, 4, 256),
            }
        }
    }

    fn node_id(level: usize, idx: usize) -> NodeId {
        NodeId::new(format!("l{level:02}_n{idx:04}")).expect("valid node id")
    }

    fn weight(level: usize, idx: usize, k: usize) -> f64 {
        1.0 + ((level * 31 + idx * 7 + k) % 13) as f64
    }

    /// Deterministic call graph with levels preset by depth.
    ///
    /// - All edges go from lower to higher levels (acyclic by construction).
    /// - Each node gets `long_edges_per_node` edges that skip at least one level, so
    ///   routing has work to do.
    /// - Every node carries `datasets` overlays with `ranks` samples each.
    pub fn dag(params: DagParams) -> GraphInput {
        assert!(params.levels >= 2, "levels must be >= 2");
        assert!(params.nodes_per_level >= 1, "nodes_per_level must be >= 1");
        assert!(params.fanout >= 1, "fanout must be >= 1");

        let mut nodes = Vec::with_capacity(params.levels * params.nodes_per_level);
        for level in 0..params.levels {
            for idx in 0..params.nodes_per_level {
                nodes.push(
                    NodeRecord::new(node_id(level, idx))
                        .with_module(format!("mod{}", idx % 5))
                        .with_level(level),
                );
            }
        }

        let mut edges = Vec::new();
        let fanout = params.fanout.min(params.nodes_per_level);
        for level in 0..params.levels.saturating_sub(1) {
            for idx in 0..params.nodes_per_level {
                for k in 0..fanout {
                    let to_idx = (idx + k) % params.nodes_per_level;
                    edges.push(EdgeRecord::new(
                        node_id(level, idx),
                        node_id(level + 1, to_idx),
                        weight(level, idx, k),
                    ));
                }

                if level + 2 >= params.levels {
                    continue;
                }
                let max_target_levels = params.levels - (level + 2);
                for k in 0..params.long_edges_per_node {
                    let target_level = level + 2 + (k % max_target_levels);
                    let to_idx = (idx + 1 + k.saturating_mul(3)) % params.nodes_per_level;
                    edges.push(EdgeRecord::new(
                        node_id(level, idx),
                        node_id(target_level, to_idx),
                        weight(level, idx, k + fanout),
                    ));
                }
            }
        }

        let mut input = GraphInput::new(nodes, edges);
        for dataset in 0..params.datasets {
            let mut overlay = BTreeMap::new();
            for (seed, record) in input.nodes.iter().enumerate() {
                let inclusive = samples(params.ranks, seed + dataset);
                let exclusive = inclusive.iter().map(|value| value / 2.0).collect();
                let scalar = inclusive.iter().copied().fold(0.0, f64::max);
                overlay.insert(
                    record.id().clone(),
                    MetricRecord::new(scalar, scalar / 2.0).with_ranks(inclusive, exclusive),
                );
            }
            let dataset_id = DatasetId::new(format!("run-{dataset}")).expect("valid dataset id");
            input = input.with_overlay(dataset_id, overlay);
        }

        input
    }

    pub fn fixture(case: Case) -> GraphInput {
        dag(case.params())
    }
}
