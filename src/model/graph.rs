// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use smallvec::SmallVec;

use super::ids::{DatasetId, NodeId};
use super::records::{EdgeRecord, GraphInput, MetricRecord, NodeRecord};

/// Incident edge indices for one node. Call graphs are sparse, so most nodes fit inline.
pub type EdgeIndices = SmallVec<[usize; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeKind {
    Normal,
    /// Synthetic routing node; carries flow only.
    Intermediate,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Intermediate => "intermediate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EdgeKind {
    Normal,
    /// First hop of a routed chain: original source to the first intermediate node.
    SourceIntermediate,
    /// Any later hop of a routed chain, ending at the original target.
    TargetIntermediate,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::SourceIntermediate => "source_intermediate",
            Self::TargetIntermediate => "target_intermediate",
        }
    }

    pub fn is_synthetic(self) -> bool {
        !matches!(self, Self::Normal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Placement {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub(crate) fn set_y(&mut self, y: f64) {
        self.y = y;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    name: String,
    module: Option<String>,
    kind: NodeKind,
    level: Option<usize>,
    weight: f64,
    inclusive: f64,
    exclusive: f64,
    placement: Option<Placement>,
    per_dataset: BTreeMap<DatasetId, MetricRecord>,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        let name = id.as_str().to_owned();
        Self {
            id,
            name,
            module: None,
            kind: NodeKind::Normal,
            level: None,
            weight: 0.0,
            inclusive: 0.0,
            exclusive: 0.0,
            placement: None,
            per_dataset: BTreeMap::new(),
        }
    }

    pub(crate) fn intermediate(id: NodeId, module: Option<String>, level: usize) -> Self {
        let mut node = Self::new(id);
        node.module = module;
        node.kind = NodeKind::Intermediate;
        node.level = Some(level);
        node
    }

    fn from_record(record: &NodeRecord) -> Self {
        let mut node = Self::new(record.id().clone());
        node.name = record.name().to_owned();
        node.module = record.module().map(str::to_owned);
        node.level = record.level();
        node.weight = record.weight();
        node
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_level(mut self, level: usize) -> Self {
        self.level = Some(level);
        self
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_intermediate(&self) -> bool {
        self.kind == NodeKind::Intermediate
    }

    pub fn level(&self) -> Option<usize> {
        self.level
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn inclusive(&self) -> f64 {
        self.inclusive
    }

    pub fn exclusive(&self) -> f64 {
        self.exclusive
    }

    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    pub fn per_dataset(&self) -> &BTreeMap<DatasetId, MetricRecord> {
        &self.per_dataset
    }

    pub fn metrics(&self, dataset: &DatasetId) -> Option<&MetricRecord> {
        self.per_dataset.get(dataset)
    }

    pub(crate) fn set_level(&mut self, level: usize) {
        self.level = Some(level);
    }

    pub(crate) fn add_weight(&mut self, weight: f64) {
        self.weight += weight;
    }

    pub(crate) fn set_flow(&mut self, inclusive: f64, exclusive: f64) {
        self.inclusive = inclusive;
        self.exclusive = exclusive;
        self.weight = inclusive;
    }

    pub(crate) fn set_placement(&mut self, placement: Option<Placement>) {
        self.placement = placement;
    }

    pub(crate) fn placement_mut(&mut self) -> Option<&mut Placement> {
        self.placement.as_mut()
    }

    pub(crate) fn insert_metrics(&mut self, dataset: DatasetId, metrics: MetricRecord) {
        self.per_dataset.insert(dataset, metrics);
    }
}

/// Vertical geometry of an edge rendered as a band between its endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeBand {
    /// Offset of the band's top from the source node's top.
    pub source_y: f64,
    /// Offset of the band's top from the target node's top.
    pub target_y: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    source: NodeId,
    target: NodeId,
    weight: f64,
    exc_weight: f64,
    kind: EdgeKind,
    origin: Option<(NodeId, NodeId)>,
    band: Option<EdgeBand>,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId, weight: f64) -> Self {
        Self {
            source,
            target,
            weight,
            exc_weight: 0.0,
            kind: EdgeKind::Normal,
            origin: None,
            band: None,
        }
    }

    pub fn with_exc_weight(mut self, exc_weight: f64) -> Self {
        self.exc_weight = exc_weight;
        self
    }

    pub(crate) fn routed(
        source: NodeId,
        target: NodeId,
        kind: EdgeKind,
        original: &Edge,
    ) -> Self {
        Self {
            source,
            target,
            weight: original.weight,
            exc_weight: original.exc_weight,
            kind,
            origin: Some((original.source.clone(), original.target.clone())),
            band: None,
        }
    }

    fn from_record(record: &EdgeRecord) -> Self {
        Self::new(record.source().clone(), record.target().clone(), record.weight())
            .with_exc_weight(record.exc_weight())
    }

    pub fn source(&self) -> &NodeId {
        &self.source
    }

    pub fn target(&self) -> &NodeId {
        &self.target
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn exc_weight(&self) -> f64 {
        self.exc_weight
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    /// The `(source, target)` of the original edge a synthetic hop replaces.
    pub fn origin(&self) -> Option<(&NodeId, &NodeId)> {
        self.origin.as_ref().map(|(source, target)| (source, target))
    }

    pub fn band(&self) -> Option<&EdgeBand> {
        self.band.as_ref()
    }

    pub(crate) fn set_band(&mut self, band: Option<EdgeBand>) {
        self.band = band;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEndpoint {
    Source,
    Target,
}

impl EdgeEndpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    UnknownEndpoint { source: NodeId, target: NodeId, endpoint: EdgeEndpoint, node_id: NodeId },
    DuplicateNode { node_id: NodeId },
    InvalidWeight { source: NodeId, target: NodeId, weight: f64 },
    UnknownOverlayNode { dataset: DatasetId, node_id: NodeId },
    InvalidLevel { node_id: NodeId, level: usize, limit: usize },
    Frozen,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEndpoint { source, target, endpoint, node_id } => write!(
                f,
                "edge {source} -> {target} references unknown {} node {node_id}",
                endpoint.as_str()
            ),
            Self::DuplicateNode { node_id } => write!(f, "duplicate node id {node_id}"),
            Self::InvalidWeight { source, target, weight } => {
                write!(f, "edge {source} -> {target} has invalid weight {weight}")
            }
            Self::UnknownOverlayNode { dataset, node_id } => {
                write!(f, "dataset {dataset} has metrics for unknown node {node_id}")
            }
            Self::InvalidLevel { node_id, level, limit } => {
                write!(f, "node {node_id} has level {level}; levels may not exceed {limit}")
            }
            Self::Frozen => f.write_str("graph is frozen after layout; mutation is not allowed"),
        }
    }
}

impl std::error::Error for GraphError {}

/// An input edge that was dropped because one of its endpoints is not a known node.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub endpoint: EdgeEndpoint,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub graph: Graph,
    pub dropped_edges: Vec<DroppedEdge>,
    pub unknown_overlay_nodes: Vec<(DatasetId, NodeId)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentEdges {
    pub incoming: EdgeIndices,
    pub outgoing: EdgeIndices,
}

/// Prebuilt incoming/outgoing edge index for every node of a graph snapshot.
///
/// Indices refer to [`Graph::edges`] at the time the adjacency was built; rebuild it
/// after any edge mutation.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    incoming: BTreeMap<NodeId, EdgeIndices>,
    outgoing: BTreeMap<NodeId, EdgeIndices>,
}

impl Adjacency {
    pub fn incoming(&self, node_id: &NodeId) -> &[usize] {
        self.incoming.get(node_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn outgoing(&self, node_id: &NodeId) -> &[usize] {
        self.outgoing.get(node_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn indegree(&self, node_id: &NodeId) -> usize {
        self.incoming(node_id).len()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: BTreeMap<NodeId, Node>,
    edges: Vec<Edge>,
    frozen: bool,
}

impl Graph {
    /// Builds a graph, failing on the first malformed record.
    pub fn build(input: &GraphInput) -> Result<Self, GraphError> {
        let outcome = Self::build_with(input, false)?;
        Ok(outcome.graph)
    }

    /// Builds a graph, dropping edges and overlay entries that reference unknown nodes.
    ///
    /// Every drop is recorded in the outcome so callers can surface the count. Duplicate
    /// nodes and invalid weights still fail.
    pub fn build_lenient(input: &GraphInput) -> Result<BuildOutcome, GraphError> {
        Self::build_with(input, true)
    }

    fn build_with(input: &GraphInput, lenient: bool) -> Result<BuildOutcome, GraphError> {
        // No call path through the input is deeper than its node count.
        let limit = input.nodes.len();
        let mut graph = Self::default();
        for record in &input.nodes {
            if let Some(level) = record.level().filter(|&level| level > limit) {
                return Err(GraphError::InvalidLevel { node_id: record.id().clone(), level, limit });
            }
            graph.add_node(Node::from_record(record))?;
        }

        let mut dropped_edges = Vec::new();
        for record in &input.edges {
            match graph.add_edge(Edge::from_record(record)) {
                Ok(_) => {}
                Err(GraphError::UnknownEndpoint { source, target, endpoint, .. }) if lenient => {
                    dropped_edges.push(DroppedEdge {
                        source,
                        target,
                        endpoint,
                        weight: record.weight(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        let mut unknown_overlay_nodes = Vec::new();
        for (dataset, metrics) in &input.overlays {
            let unknown = graph.apply_overlay(dataset, metrics);
            if let Some(node_id) = unknown.first() {
                if !lenient {
                    return Err(GraphError::UnknownOverlayNode {
                        dataset: dataset.clone(),
                        node_id: node_id.clone(),
                    });
                }
            }
            unknown_overlay_nodes
                .extend(unknown.into_iter().map(|node_id| (dataset.clone(), node_id)));
        }

        Ok(BuildOutcome { graph, dropped_edges, unknown_overlay_nodes })
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub(crate) fn node_mut(&mut self, node_id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(node_id)
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    pub fn contains_node(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub(crate) fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.frozen {
            return Err(GraphError::Frozen);
        }
        if self.nodes.contains_key(node.id()) {
            return Err(GraphError::DuplicateNode { node_id: node.id().clone() });
        }
        self.nodes.insert(node.id().clone(), node);
        Ok(())
    }

    /// Appends an edge and returns its index.
    pub fn add_edge(&mut self, edge: Edge) -> Result<usize, GraphError> {
        if self.frozen {
            return Err(GraphError::Frozen);
        }
        for (endpoint, node_id) in
            [(EdgeEndpoint::Source, edge.source()), (EdgeEndpoint::Target, edge.target())]
        {
            if !self.nodes.contains_key(node_id) {
                return Err(GraphError::UnknownEndpoint {
                    source: edge.source().clone(),
                    target: edge.target().clone(),
                    endpoint,
                    node_id: node_id.clone(),
                });
            }
        }
        for weight in [edge.weight(), edge.exc_weight()] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(GraphError::InvalidWeight {
                    source: edge.source().clone(),
                    target: edge.target().clone(),
                    weight,
                });
            }
        }

        self.edges.push(edge);
        Ok(self.edges.len() - 1)
    }

    /// Removes every edge matching `predicate` and returns the removed edges in order.
    pub fn remove_edges_matching<F>(&mut self, mut predicate: F) -> Result<Vec<Edge>, GraphError>
    where
        F: FnMut(&Edge) -> bool,
    {
        if self.frozen {
            return Err(GraphError::Frozen);
        }
        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.edges).into_iter().partition(|edge| predicate(edge));
        self.edges = kept;
        Ok(removed)
    }

    /// Removes the given nodes together with every edge touching them and returns the
    /// removed edges in order. Ids that name no node are ignored.
    pub fn remove_nodes(&mut self, node_ids: &BTreeSet<NodeId>) -> Result<Vec<Edge>, GraphError> {
        if self.frozen {
            return Err(GraphError::Frozen);
        }
        self.nodes.retain(|node_id, _| !node_ids.contains(node_id));
        self.remove_edges_matching(|edge| {
            node_ids.contains(edge.source()) || node_ids.contains(edge.target())
        })
    }

    pub fn nodes_at(&self, level: usize) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(move |node| node.level() == Some(level))
    }

    pub fn incident_edges(&self, node_id: &NodeId) -> IncidentEdges {
        let mut incident = IncidentEdges::default();
        for (idx, edge) in self.edges.iter().enumerate() {
            if edge.target() == node_id {
                incident.incoming.push(idx);
            }
            if edge.source() == node_id {
                incident.outgoing.push(idx);
            }
        }
        incident
    }

    pub fn adjacency(&self) -> Adjacency {
        let mut adjacency = Adjacency::default();
        for node_id in self.nodes.keys() {
            adjacency.incoming.insert(node_id.clone(), EdgeIndices::new());
            adjacency.outgoing.insert(node_id.clone(), EdgeIndices::new());
        }
        for (idx, edge) in self.edges.iter().enumerate() {
            if let Some(out) = adjacency.outgoing.get_mut(edge.source()) {
                out.push(idx);
            }
            if let Some(inc) = adjacency.incoming.get_mut(edge.target()) {
                inc.push(idx);
            }
        }
        adjacency
    }

    pub fn max_level(&self) -> Option<usize> {
        self.nodes.values().filter_map(Node::level).max()
    }

    /// Attaches one dataset's metrics to the matching nodes and returns the ids that
    /// matched no node. Intermediate nodes never receive metrics.
    pub fn apply_overlay(
        &mut self,
        dataset: &DatasetId,
        metrics: &BTreeMap<NodeId, MetricRecord>,
    ) -> Vec<NodeId> {
        let mut unknown = Vec::new();
        for (node_id, record) in metrics {
            match self.nodes.get_mut(node_id) {
                Some(node) if !node.is_intermediate() => {
                    node.insert_metrics(dataset.clone(), record.clone());
                }
                _ => unknown.push(node_id.clone()),
            }
        }
        unknown
    }
}
