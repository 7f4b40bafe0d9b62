// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Layered flow layout.
//!
//! The stages run in order on one [`crate::model::Graph`]: optional pruning of cheap call
//! sites, cycle check, level assignment,
//! routing of level-skipping edges through intermediate nodes, flow aggregation, and
//! finally node placement with edge bands.

pub mod cycle;
pub mod filter;
pub mod flow;
pub mod levels;
pub mod route;
pub mod sankey;

pub use cycle::{detect_cycle, ensure_acyclic, Cycle, CyclicGraph};
pub use filter::{prune_by_inclusive, PruneReport};
pub use flow::aggregate;
pub use levels::{assign_levels, LevelAssignment};
pub use route::{route, DisconnectedEdgeWarning, RouteReport};
pub use sankey::{layout, SankeyLayout};
