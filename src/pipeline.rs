// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! One layout request, end to end.
//!
//! Structural problems (bad config, malformed input, cycles) abort the request. Per-edge
//! anomalies are collected into the [`LayoutReport`] and the layout still completes.

use std::fmt;

use crate::config::{ConfigError, LayoutConfig, UnknownEndpointPolicy};
use crate::layout::{aggregate, assign_levels, ensure_acyclic, layout, prune_by_inclusive, route};
use crate::layout::{CyclicGraph, DisconnectedEdgeWarning};
use crate::model::{merge_ensemble, DatasetId, DroppedEdge, Graph, GraphError, GraphInput, NodeId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutReport {
    /// Input edges dropped because an endpoint is not a known node.
    pub dropped_edges: Vec<DroppedEdge>,
    pub unknown_overlay_nodes: Vec<(DatasetId, NodeId)>,
    /// Call sites removed by the inclusive-time filter.
    pub pruned_nodes: Vec<NodeId>,
    pub pruned_edges: usize,
    /// Edges left unrouted because an endpoint has no level.
    pub disconnected_edges: Vec<DisconnectedEdgeWarning>,
    pub intermediate_nodes: Vec<NodeId>,
    pub routed_edges: usize,
    /// Same-level or backward edges, passed through unrouted.
    pub non_forward_edges: usize,
    pub ensemble_nodes: usize,
    pub max_level: Option<usize>,
    pub iterations_run: usize,
    /// Pixels per unit of flow.
    pub ky: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOutcome {
    /// Frozen, fully placed graph.
    pub graph: Graph,
    pub report: LayoutReport,
}

#[derive(Debug)]
pub enum LayoutRequestError {
    Config { source: Box<ConfigError> },
    MalformedInput { source: Box<GraphError> },
    Cyclic { source: Box<CyclicGraph> },
}

impl fmt::Display for LayoutRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { source } => write!(f, "invalid layout config: {source}"),
            Self::MalformedInput { source } => write!(f, "malformed graph input: {source}"),
            Self::Cyclic { source } => write!(f, "cannot lay out graph: {source}"),
        }
    }
}

impl std::error::Error for LayoutRequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config { source } => Some(source.as_ref()),
            Self::MalformedInput { source } => Some(source.as_ref()),
            Self::Cyclic { source } => Some(source.as_ref()),
        }
    }
}

impl From<ConfigError> for LayoutRequestError {
    fn from(source: ConfigError) -> Self {
        Self::Config { source: Box::new(source) }
    }
}

impl From<GraphError> for LayoutRequestError {
    fn from(source: GraphError) -> Self {
        Self::MalformedInput { source: Box::new(source) }
    }
}

impl From<CyclicGraph> for LayoutRequestError {
    fn from(source: CyclicGraph) -> Self {
        Self::Cyclic { source: Box::new(source) }
    }
}

/// Builds, filters, levels, routes, aggregates and places `input` under `config`.
pub fn run_layout(
    input: &GraphInput,
    config: &LayoutConfig,
) -> Result<LayoutOutcome, LayoutRequestError> {
    config.validate()?;
    let mut report = LayoutReport::default();

    let mut graph = {
        let _span = tracing::debug_span!("build", nodes = input.nodes.len(), edges = input.edges.len())
            .entered();
        match config.unknown_endpoints {
            UnknownEndpointPolicy::Reject => Graph::build(input)?,
            UnknownEndpointPolicy::Drop => {
                let outcome = Graph::build_lenient(input)?;
                for dropped in &outcome.dropped_edges {
                    tracing::warn!(
                        source = %dropped.source,
                        target = %dropped.target,
                        endpoint = dropped.endpoint.as_str(),
                        "dropped edge with unknown endpoint"
                    );
                }
                for (dataset, node_id) in &outcome.unknown_overlay_nodes {
                    tracing::warn!(%dataset, %node_id, "dropped metrics for unknown node");
                }
                report.dropped_edges = outcome.dropped_edges;
                report.unknown_overlay_nodes = outcome.unknown_overlay_nodes;
                outcome.graph
            }
        }
    };

    if config.merge_ensemble {
        report.ensemble_nodes = merge_ensemble(&mut graph);
    }

    if let Some(percent) = config.filter_percent {
        let _span = tracing::debug_span!("filter", percent).entered();
        let pruned = prune_by_inclusive(&mut graph, percent)?;
        report.pruned_edges = pruned.pruned_edges().len();
        report.pruned_nodes = pruned.pruned_nodes().to_vec();
    }

    {
        let _span = tracing::debug_span!("levels").entered();
        ensure_acyclic(&graph)?;
        assign_levels(&mut graph);
    }

    {
        let _span = tracing::debug_span!("route").entered();
        let routed = route(&mut graph)?;
        report.intermediate_nodes = routed.intermediate_nodes().to_vec();
        report.routed_edges = routed.routed_edges();
        report.non_forward_edges = routed.non_forward_edges();
        report.disconnected_edges = routed.warnings().to_vec();
    }

    aggregate(&mut graph);

    {
        let _span = tracing::debug_span!("place", iterations = config.iterations).entered();
        let placed = layout(&mut graph, config)?;
        report.iterations_run = placed.iterations_run();
        report.ky = placed.ky();
    }
    report.max_level = graph.max_level();

    tracing::debug!(
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        dropped = report.dropped_edges.len(),
        pruned = report.pruned_nodes.len(),
        intermediates = report.intermediate_nodes.len(),
        "layout request complete"
    );

    Ok(LayoutOutcome { graph, report })
}
