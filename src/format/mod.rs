// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Graph ingestion and layout export.
//!
//! Input is a profiler-style JSON graph; output is a flat document with string ids that
//! a renderer can draw directly.

pub mod json;

pub use json::{
    histograms_document, layout_document, layout_document_schema, parse_graph_json,
    FormatError, HistogramsDocument, LayoutDocument, LinkDocument, NodeDocument,
    OverlayNodeDocument, ReportDocument, SkippedEdgeDocument,
};
