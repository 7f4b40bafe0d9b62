// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use super::graph::Graph;
use super::ids::{DatasetId, NodeId};
use super::records::{EdgeRecord, GraphInput, MetricRecord, NodeRecord};

fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

fn node(id: &str, module: &str) -> NodeRecord {
    NodeRecord::new(nid(id)).with_module(module)
}

fn edge(source: &str, target: &str, weight: f64) -> EdgeRecord {
    EdgeRecord::new(nid(source), nid(target), weight)
}

fn build(input: &GraphInput) -> Graph {
    Graph::build(input).expect("fixture graph")
}

/// `main -> {solve, io}`, `solve -> mpi`; no preset levels.
pub(crate) fn call_tree_small_input() -> GraphInput {
    GraphInput::new(
        vec![
            node("main", "app"),
            node("solve", "app"),
            node("io", "libc"),
            node("mpi", "libmpi"),
        ],
        vec![edge("main", "solve", 8.0), edge("main", "io", 2.0), edge("solve", "mpi", 5.0)],
    )
}

pub(crate) fn call_tree_small() -> Graph {
    build(&call_tree_small_input())
}

/// `root -> mid` spans one level, `root -> leaf` spans three (levels preset by the
/// profiler's call depth).
pub(crate) fn skip_level_input() -> GraphInput {
    GraphInput::new(
        vec![
            node("root", "app").with_level(0),
            node("mid", "app").with_level(1),
            node("leaf", "libm").with_level(3),
        ],
        vec![edge("root", "mid", 10.0), edge("root", "leaf", 10.0)],
    )
}

pub(crate) fn skip_level() -> Graph {
    build(&skip_level_input())
}

/// Two parents at different depths converge on `sink` (level 3), so routing must share
/// the intermediate node at level 2.
pub(crate) fn converging_long_edges() -> Graph {
    build(&GraphInput::new(
        vec![
            node("a", "app").with_level(0),
            node("b", "app").with_level(1),
            node("sink", "libc").with_level(3),
        ],
        vec![edge("a", "b", 1.0), edge("a", "sink", 4.0), edge("b", "sink", 6.0)],
    ))
}

/// `A -> B -> C -> A` reachable from an entry node.
pub(crate) fn triangle_cycle() -> Graph {
    build(&GraphInput::new(
        vec![node("entry", "app"), node("A", "app"), node("B", "app"), node("C", "app")],
        vec![
            edge("entry", "A", 1.0),
            edge("A", "B", 1.0),
            edge("B", "C", 1.0),
            edge("C", "A", 1.0),
        ],
    ))
}

/// A small layered graph with two datasets attached to the normal nodes.
pub(crate) fn two_run_overlay_input() -> GraphInput {
    let run0 = DatasetId::new("run-0").expect("dataset id");
    let run1 = DatasetId::new("run-1").expect("dataset id");

    let mut metrics0 = BTreeMap::new();
    metrics0.insert(
        nid("main"),
        MetricRecord::new(10.0, 1.0).with_ranks(vec![9.0, 10.0], vec![1.0, 1.0]),
    );
    metrics0.insert(
        nid("solve"),
        MetricRecord::new(8.0, 3.0).with_ranks(vec![6.0, 8.0], vec![2.0, 3.0]),
    );

    let mut metrics1 = BTreeMap::new();
    metrics1.insert(
        nid("main"),
        MetricRecord::new(12.0, 2.0).with_ranks(vec![11.0, 12.0], vec![2.0, 2.0]),
    );
    metrics1.insert(
        nid("solve"),
        MetricRecord::new(7.0, 4.0).with_ranks(vec![5.0, 7.0], vec![3.0, 4.0]),
    );

    call_tree_small_input().with_overlay(run0, metrics0).with_overlay(run1, metrics1)
}

pub(crate) fn two_run_overlay() -> Graph {
    build(&two_run_overlay_input())
}
