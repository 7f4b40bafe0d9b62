// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A [`Graph`] owns its nodes and edges; edges refer to nodes by id only. Input arrives as
//! normalized [`records`] and optional per-dataset metric overlays.

pub mod ensemble;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod graph;
pub mod ids;
pub mod records;

pub use ensemble::merge_ensemble;
pub use graph::{
    Adjacency, BuildOutcome, DroppedEdge, Edge, EdgeBand, EdgeEndpoint, EdgeIndices, EdgeKind,
    Graph, GraphError, IncidentEdges, Node, NodeKind, Placement,
};
pub use ids::{DatasetId, Id, IdError, NodeId, ENSEMBLE_DATASET};
pub use records::{EdgeRecord, GraphInput, MetricRecord, NodeRecord};
