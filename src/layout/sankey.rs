// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use crate::config::{ConfigError, LayoutConfig};
use crate::model::graph::{EdgeBand, Graph, Placement};
use crate::model::ids::NodeId;

/// Damping applied to the relaxation step after every iteration.
const ALPHA_DECAY: f64 = 0.99;

#[derive(Debug, Clone, PartialEq)]
pub struct SankeyLayout {
    levels: BTreeMap<usize, Vec<NodeId>>,
    ky: f64,
    iterations_run: usize,
}

impl SankeyLayout {
    /// Nodes of each occupied level, top to bottom.
    pub fn levels(&self) -> &BTreeMap<usize, Vec<NodeId>> {
        &self.levels
    }

    /// Pixels per unit of flow.
    pub fn ky(&self) -> f64 {
        self.ky
    }

    pub fn iterations_run(&self) -> usize {
        self.iterations_run
    }
}

fn placement(graph: &Graph, node_id: &NodeId) -> Placement {
    *graph.node(node_id).and_then(|node| node.placement()).expect("leveled nodes are placed")
}

fn placement_mut<'a>(graph: &'a mut Graph, node_id: &NodeId) -> &'a mut Placement {
    graph.node_mut(node_id).and_then(|node| node.placement_mut()).expect("leveled nodes are placed")
}

/// Flow-to-pixel scale: the reference flow fills the usable height of the widest level,
/// and no level may overflow the canvas at that scale.
fn flow_scale(graph: &Graph, levels: &BTreeMap<usize, Vec<NodeId>>, config: &LayoutConfig) -> f64 {
    let usable = |nodes: usize| {
        let gaps = nodes.saturating_sub(1) as f64;
        (config.canvas_height - config.node_padding * gaps).max(0.0)
    };
    let level_weight = |ids: &[NodeId]| {
        ids.iter().filter_map(|id| graph.node(id)).map(|node| node.weight()).sum::<f64>()
    };

    let reference = config
        .reference_value
        .unwrap_or_else(|| levels.get(&0).map(|ids| level_weight(ids)).unwrap_or(0.0));

    let mut ky = f64::INFINITY;
    if reference > 0.0 {
        let widest = levels.values().map(Vec::len).max().unwrap_or(0);
        ky = usable(widest) / reference;
    }
    for ids in levels.values() {
        let total = level_weight(ids);
        if total > 0.0 {
            ky = ky.min(usable(ids.len()) / total);
        }
    }

    if ky.is_finite() {
        ky
    } else {
        0.0
    }
}

/// Sorts one level by `y` and stacks it without overlap, pushing the stack back up from
/// the bottom if it runs past the canvas.
fn resolve_collisions(graph: &mut Graph, ids: &mut [NodeId], padding: f64, canvas_height: f64) {
    ids.sort_by(|a, b| {
        placement(graph, a).y().total_cmp(&placement(graph, b).y()).then_with(|| a.cmp(b))
    });

    let mut y0 = 0.0f64;
    for id in ids.iter() {
        let p = placement_mut(graph, id);
        if y0 > p.y() {
            p.set_y(y0);
        }
        y0 = p.bottom() + padding;
    }

    let overflow = y0 - padding - canvas_height;
    if overflow <= 0.0 {
        return;
    }

    let mut y_below = f64::INFINITY;
    for (pos, id) in ids.iter().enumerate().rev() {
        let p = placement_mut(graph, id);
        if pos + 1 == ids.len() {
            p.set_y(p.y() - overflow);
        } else {
            let dy = p.bottom() + padding - y_below;
            if dy > 0.0 {
                p.set_y(p.y() - dy);
            }
        }
        y_below = p.y();
    }
}

/// Places every leveled node and computes edge bands, then freezes the graph.
///
/// - `x` depends only on the level.
/// - `height = max(weight * ky, min_node_scale)`.
/// - `y` starts stacked in id order and is relaxed `iterations` times: each node with
///   neighbours moves its center toward the flow-weighted mean center of the nodes on its
///   incoming and outgoing edges, then its level is re-stacked. The step is damped by a
///   factor that starts at 1 and decays by 0.99 per iteration.
///
/// Unleveled nodes get no placement and edges touching them get no band.
pub fn layout(graph: &mut Graph, config: &LayoutConfig) -> Result<SankeyLayout, ConfigError> {
    config.validate()?;

    // Buckets only for occupied levels; `x` comes from the level number itself.
    let max_level = graph.max_level().unwrap_or(0);
    let mut levels = BTreeMap::<usize, Vec<NodeId>>::new();
    for node in graph.nodes().values() {
        if let Some(level) = node.level() {
            levels.entry(level).or_default().push(node.id().clone());
        }
    }

    let dx = (config.canvas_width - config.node_width) / max_level.max(1) as f64;
    let ky = flow_scale(graph, &levels, config);

    for node in graph.nodes_mut() {
        node.set_placement(None);
    }
    for (&level, ids) in &levels {
        let mut y = 0.0;
        for id in ids {
            let node = graph.node_mut(id).expect("node exists");
            let height = (node.weight() * ky).max(config.min_node_scale);
            node.set_placement(Some(Placement::new(level as f64 * dx, y, config.node_width, height)));
            y += height + config.node_padding;
        }
    }

    let mut neighbours = BTreeMap::<NodeId, Vec<(NodeId, f64)>>::new();
    for edge in graph.edges() {
        let placed = |id: &NodeId| graph.node(id).and_then(|node| node.level()).is_some();
        if !placed(edge.source()) || !placed(edge.target()) || edge.source() == edge.target() {
            continue;
        }
        neighbours
            .entry(edge.source().clone())
            .or_default()
            .push((edge.target().clone(), edge.weight()));
        neighbours
            .entry(edge.target().clone())
            .or_default()
            .push((edge.source().clone(), edge.weight()));
    }

    let mut alpha = 1.0f64;
    let mut iterations_run = 0usize;
    for _ in 0..config.iterations {
        iterations_run += 1;
        let mut max_shift = 0.0f64;

        for ids in levels.values_mut() {
            let before = ids.iter().map(|id| (id.clone(), placement(graph, id).y())).collect::<Vec<_>>();

            for id in ids.iter() {
                let Some(links) = neighbours.get(id) else {
                    continue;
                };
                let total = links.iter().map(|(_, weight)| weight).sum::<f64>();
                let target_center = if total > 0.0 {
                    links
                        .iter()
                        .map(|(other, weight)| placement(graph, other).center_y() * weight)
                        .sum::<f64>()
                        / total
                } else {
                    links.iter().map(|(other, _)| placement(graph, other).center_y()).sum::<f64>()
                        / links.len() as f64
                };

                let p = placement_mut(graph, id);
                let step = (target_center - p.center_y()) * alpha;
                p.set_y(p.y() + step);
            }

            resolve_collisions(graph, ids, config.node_padding, config.canvas_height);

            for (id, y) in before {
                max_shift = max_shift.max((placement(graph, &id).y() - y).abs());
            }
        }

        alpha *= ALPHA_DECAY;
        if config.convergence_epsilon.is_some_and(|epsilon| max_shift < epsilon) {
            break;
        }
    }

    assign_edge_bands(graph, ky);
    graph.freeze();

    tracing::debug!(
        levels = levels.len(),
        ky,
        iterations_run,
        "sankey layout complete"
    );

    Ok(SankeyLayout { levels, ky, iterations_run })
}

/// Stacks bands at each node in the vertical order of the opposite endpoints, so bands
/// leave and enter nodes without crossing each other at the node.
fn assign_edge_bands(graph: &mut Graph, ky: f64) {
    let adjacency = graph.adjacency();
    let edges = graph.edges();
    let center_of = |id: &NodeId| graph.node(id).and_then(|node| node.placement()).map(Placement::center_y);

    let mut source_offsets = vec![None::<f64>; edges.len()];
    let mut target_offsets = vec![None::<f64>; edges.len()];

    for node_id in graph.nodes().keys() {
        if center_of(node_id).is_none() {
            continue;
        }

        let mut outgoing = adjacency
            .outgoing(node_id)
            .iter()
            .copied()
            .filter_map(|idx| center_of(edges[idx].target()).map(|y| (y, idx)))
            .collect::<Vec<_>>();
        outgoing.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let mut offset = 0.0;
        for (_, idx) in outgoing {
            source_offsets[idx] = Some(offset);
            offset += edges[idx].weight() * ky;
        }

        let mut incoming = adjacency
            .incoming(node_id)
            .iter()
            .copied()
            .filter_map(|idx| center_of(edges[idx].source()).map(|y| (y, idx)))
            .collect::<Vec<_>>();
        incoming.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let mut offset = 0.0;
        for (_, idx) in incoming {
            target_offsets[idx] = Some(offset);
            offset += edges[idx].weight() * ky;
        }
    }

    let widths = edges.iter().map(|edge| edge.weight() * ky).collect::<Vec<_>>();
    for (idx, edge) in graph.edges_mut().iter_mut().enumerate() {
        let band = match (source_offsets[idx], target_offsets[idx]) {
            (Some(source_y), Some(target_y)) => {
                Some(EdgeBand { source_y, target_y, width: widths[idx] })
            }
            _ => None,
        };
        edge.set_band(band);
    }
}
