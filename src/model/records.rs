// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Normalized input records.
//!
//! Every ingestion path (JSON, benchmarks, tests) produces these fixed shapes before a
//! [`Graph`](super::Graph) is built, so the pipeline never branches on record shape.

use std::collections::BTreeMap;

use super::ids::{DatasetId, NodeId};

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    id: NodeId,
    name: String,
    module: Option<String>,
    level: Option<usize>,
    weight: f64,
}

impl NodeRecord {
    pub fn new(id: NodeId) -> Self {
        let name = id.as_str().to_owned();
        Self { id, name, module: None, level: None, weight: 0.0 }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Presets the node's depth (e.g. the call-path depth reported by the profiler).
    pub fn with_level(mut self, level: usize) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
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

    pub fn level(&self) -> Option<usize> {
        self.level
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    source: NodeId,
    target: NodeId,
    weight: f64,
    exc_weight: f64,
}

impl EdgeRecord {
    pub fn new(source: NodeId, target: NodeId, weight: f64) -> Self {
        Self { source, target, weight, exc_weight: 0.0 }
    }

    pub fn with_exc_weight(mut self, exc_weight: f64) -> Self {
        self.exc_weight = exc_weight;
        self
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
}

/// Per-dataset metrics for one node: scalar times plus the per-rank observations used
/// for distributions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricRecord {
    pub inclusive: f64,
    pub exclusive: f64,
    pub inclusive_by_rank: Vec<f64>,
    pub exclusive_by_rank: Vec<f64>,
}

impl MetricRecord {
    pub fn new(inclusive: f64, exclusive: f64) -> Self {
        Self { inclusive, exclusive, ..Self::default() }
    }

    pub fn with_ranks(mut self, inclusive_by_rank: Vec<f64>, exclusive_by_rank: Vec<f64>) -> Self {
        self.inclusive_by_rank = inclusive_by_rank;
        self.exclusive_by_rank = exclusive_by_rank;
        self
    }
}

/// One layout request's worth of raw data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphInput {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub overlays: BTreeMap<DatasetId, BTreeMap<NodeId, MetricRecord>>,
}

impl GraphInput {
    pub fn new(nodes: Vec<NodeRecord>, edges: Vec<EdgeRecord>) -> Self {
        Self { nodes, edges, overlays: BTreeMap::new() }
    }

    pub fn with_overlay(
        mut self,
        dataset: DatasetId,
        metrics: BTreeMap<NodeId, MetricRecord>,
    ) -> Self {
        self.overlays.insert(dataset, metrics);
        self
    }
}
