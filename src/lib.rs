// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Tributary: layered flow layout and rank distributions for profiled call graphs.
//!
//! A request turns a weighted call graph into a Sankey-style layout: nodes are grouped
//! into levels, edges that skip levels are routed through intermediate nodes, node sizes
//! follow the flow through them, and vertical positions are relaxed to shorten bands.
//! Per-rank samples attached to nodes can be binned into histograms, including a merged
//! ensemble of several profiling runs.

pub mod config;
pub mod distribution;
pub mod format;
pub mod layout;
pub mod model;
pub mod pipeline;
