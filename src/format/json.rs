// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::distribution::{Histogram, Metric, NodeHistograms};
use crate::model::{
    DatasetId, EdgeRecord, GraphInput, IdError, MetricRecord, NodeId, NodeRecord,
};
use crate::pipeline::LayoutOutcome;

#[derive(Debug)]
pub enum FormatError {
    Json {
        source: serde_json::Error,
    },
    MissingNodeId {
        index: usize,
    },
    AmbiguousName {
        index: usize,
        names: Vec<String>,
    },
    InvalidId {
        field: &'static str,
        value: String,
        source: Box<IdError>,
    },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { source } => write!(f, "invalid graph JSON: {source}"),
            Self::MissingNodeId { index } => {
                write!(f, "node {index} has neither an id nor a name")
            }
            Self::AmbiguousName { index, names } => write!(
                f,
                "node {index} has {} names (expected exactly one): {names:?}",
                names.len()
            ),
            Self::InvalidId { field, value, source } => {
                write!(f, "invalid {field} {value:?}: {source}")
            }
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json { source } => Some(source),
            Self::InvalidId { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawGraph {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default, alias = "edges")]
    links: Vec<RawLink>,
    #[serde(default)]
    datasets: BTreeMap<String, BTreeMap<String, RawMetrics>>,
}

/// Profiler exports sometimes wrap a node's name in a one-element list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawName {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct RawNode {
    id: Option<String>,
    name: Option<RawName>,
    module: Option<String>,
    level: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    source: String,
    target: String,
    weight: f64,
    #[serde(default)]
    exc_weight: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMetrics {
    inclusive: f64,
    exclusive: f64,
    inclusive_by_rank: Vec<f64>,
    exclusive_by_rank: Vec<f64>,
}

fn node_id(field: &'static str, value: &str) -> Result<NodeId, FormatError> {
    NodeId::new(value).map_err(|source| FormatError::InvalidId {
        field,
        value: value.to_owned(),
        source: Box::new(source),
    })
}

fn normalize_name(index: usize, name: RawName) -> Result<String, FormatError> {
    match name {
        RawName::One(name) => Ok(name),
        RawName::Many(mut names) if names.len() == 1 => Ok(names.remove(0)),
        RawName::Many(names) => Err(FormatError::AmbiguousName { index, names }),
    }
}

/// Parses a graph document into normalized records.
///
/// Keys other than the ones read here (for example `time (inc)`) are ignored.
pub fn parse_graph_json(raw: &str) -> Result<GraphInput, FormatError> {
    let raw: RawGraph = serde_json::from_str(raw).map_err(|source| FormatError::Json { source })?;

    let mut nodes = Vec::with_capacity(raw.nodes.len());
    for (index, node) in raw.nodes.into_iter().enumerate() {
        let name = node.name.map(|name| normalize_name(index, name)).transpose()?;
        let id = match (node.id, &name) {
            (Some(id), _) => id,
            (None, Some(name)) => name.clone(),
            (None, None) => return Err(FormatError::MissingNodeId { index }),
        };

        let mut record = NodeRecord::new(node_id("node id", &id)?);
        if let Some(name) = name {
            record = record.with_name(name);
        }
        if let Some(module) = node.module {
            record = record.with_module(module);
        }
        if let Some(level) = node.level {
            record = record.with_level(level);
        }
        nodes.push(record);
    }

    let mut edges = Vec::with_capacity(raw.links.len());
    for link in raw.links {
        let source = node_id("link source", &link.source)?;
        let target = node_id("link target", &link.target)?;
        edges.push(EdgeRecord::new(source, target, link.weight).with_exc_weight(link.exc_weight));
    }

    let mut input = GraphInput::new(nodes, edges);
    for (dataset, metrics) in raw.datasets {
        let dataset_id = DatasetId::new(&dataset).map_err(|source| FormatError::InvalidId {
            field: "dataset",
            value: dataset.clone(),
            source: Box::new(source),
        })?;
        let mut overlay = BTreeMap::new();
        for (node, metric) in metrics {
            let record = MetricRecord::new(metric.inclusive, metric.exclusive)
                .with_ranks(metric.inclusive_by_rank, metric.exclusive_by_rank);
            overlay.insert(node_id("dataset node", &node)?, record);
        }
        input = input.with_overlay(dataset_id, overlay);
    }

    Ok(input)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeDocument {
    pub id: String,
    pub name: String,
    pub module: Option<String>,
    pub kind: String,
    pub level: Option<usize>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub weight: f64,
    pub inclusive: f64,
    pub exclusive: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LinkDocument {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub exc_weight: f64,
    pub kind: String,
    pub source_y: Option<f64>,
    pub target_y: Option<f64>,
    pub width: Option<f64>,
    pub original_source: Option<String>,
    pub original_target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SkippedEdgeDocument {
    pub source: String,
    pub target: String,
    /// `source` or `target`.
    pub endpoint: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OverlayNodeDocument {
    pub dataset: String,
    pub node_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportDocument {
    pub dropped_edges: Vec<SkippedEdgeDocument>,
    pub unknown_overlay_nodes: Vec<OverlayNodeDocument>,
    pub pruned_nodes: Vec<String>,
    pub pruned_edges: usize,
    /// Edges left unrouted; `endpoint` names the unleveled end.
    pub disconnected_edges: Vec<SkippedEdgeDocument>,
    pub intermediate_nodes: Vec<String>,
    pub routed_edges: usize,
    pub non_forward_edges: usize,
    pub ensemble_nodes: usize,
    pub iterations_run: usize,
    pub ky: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LayoutDocument {
    pub max_level: Option<usize>,
    pub nodes: Vec<NodeDocument>,
    pub links: Vec<LinkDocument>,
    pub report: ReportDocument,
}

pub fn layout_document(outcome: &LayoutOutcome) -> LayoutDocument {
    let graph = &outcome.graph;
    let report = &outcome.report;
    let max_level = report.max_level;

    let nodes = graph
        .nodes()
        .values()
        .map(|node| {
            let placement = node.placement();
            NodeDocument {
                id: node.id().to_string(),
                name: node.name().to_owned(),
                module: node.module().map(str::to_owned),
                kind: node.kind().as_str().to_owned(),
                level: node.level(),
                x: placement.map(|p| p.x()),
                y: placement.map(|p| p.y()),
                width: placement.map(|p| p.width()),
                height: placement.map(|p| p.height()),
                weight: node.weight(),
                inclusive: node.inclusive(),
                exclusive: node.exclusive(),
            }
        })
        .collect();

    let links = graph
        .edges()
        .iter()
        .map(|edge| {
            let band = edge.band();
            let origin = edge.origin();
            LinkDocument {
                source: edge.source().to_string(),
                target: edge.target().to_string(),
                weight: edge.weight(),
                exc_weight: edge.exc_weight(),
                kind: edge.kind().as_str().to_owned(),
                source_y: band.map(|b| b.source_y),
                target_y: band.map(|b| b.target_y),
                width: band.map(|b| b.width),
                original_source: origin.map(|(source, _)| source.to_string()),
                original_target: origin.map(|(_, target)| target.to_string()),
            }
        })
        .collect();

    let report = ReportDocument {
        dropped_edges: report
            .dropped_edges
            .iter()
            .map(|dropped| SkippedEdgeDocument {
                source: dropped.source.to_string(),
                target: dropped.target.to_string(),
                endpoint: dropped.endpoint.as_str().to_owned(),
                weight: dropped.weight,
            })
            .collect(),
        unknown_overlay_nodes: report
            .unknown_overlay_nodes
            .iter()
            .map(|(dataset, node_id)| OverlayNodeDocument {
                dataset: dataset.to_string(),
                node_id: node_id.to_string(),
            })
            .collect(),
        pruned_nodes: report.pruned_nodes.iter().map(ToString::to_string).collect(),
        pruned_edges: report.pruned_edges,
        disconnected_edges: report
            .disconnected_edges
            .iter()
            .map(|warning| SkippedEdgeDocument {
                source: warning.source.to_string(),
                target: warning.target.to_string(),
                endpoint: warning.unleveled.as_str().to_owned(),
                weight: warning.weight,
            })
            .collect(),
        intermediate_nodes: report.intermediate_nodes.iter().map(ToString::to_string).collect(),
        routed_edges: report.routed_edges,
        non_forward_edges: report.non_forward_edges,
        ensemble_nodes: report.ensemble_nodes,
        iterations_run: report.iterations_run,
        ky: report.ky,
    };

    LayoutDocument { max_level, nodes, links, report }
}

pub fn layout_document_schema() -> schemars::Schema {
    schemars::schema_for!(LayoutDocument)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HistogramsDocument {
    pub dataset: String,
    pub metric: Metric,
    pub bin_count: usize,
    /// Tallest bin across every histogram, for a shared y-scale.
    pub global_max: u64,
    pub histograms: BTreeMap<String, Histogram>,
    pub skipped: Vec<String>,
    /// Node id to the reason its samples could not be binned.
    pub failed: BTreeMap<String, String>,
}

pub fn histograms_document(
    batch: &NodeHistograms,
    dataset: &DatasetId,
    metric: Metric,
    bin_count: usize,
) -> HistogramsDocument {
    HistogramsDocument {
        dataset: dataset.to_string(),
        metric,
        bin_count,
        global_max: batch.global_max(),
        histograms: batch
            .histograms
            .iter()
            .map(|(node_id, histogram)| (node_id.to_string(), histogram.clone()))
            .collect(),
        skipped: batch.skipped.iter().map(ToString::to_string).collect(),
        failed: batch
            .failed
            .iter()
            .map(|(node_id, err)| (node_id.to_string(), err.to_string()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{layout_document, layout_document_schema, parse_graph_json, FormatError};
    use crate::config::LayoutConfig;
    use crate::model::{DatasetId, NodeId};
    use crate::pipeline::run_layout;

    fn nid(value: &str) -> NodeId {
        NodeId::new(value).expect("node id")
    }

    #[test]
    fn parses_nodes_links_and_datasets() {
        let input = parse_graph_json(
            r#"{
                "nodes": [
                    {"id": "main", "name": "main", "module": "app", "level": 0, "time (inc)": 12.5},
                    {"id": "solve", "module": "app"}
                ],
                "links": [{"source": "main", "target": "solve", "weight": 10.0, "exc_weight": 2.0}],
                "datasets": {
                    "run-0": {"main": {"inclusive": 1, "exclusive": 0, "inclusive_by_rank": [1, 2]}}
                }
            }"#,
        )
        .expect("graph");

        assert_eq!(input.nodes.len(), 2);
        assert_eq!(input.nodes[0].level(), Some(0));
        assert_eq!(input.nodes[1].name(), "solve");
        assert_eq!(input.edges[0].exc_weight(), 2.0);

        let run0 = &input.overlays[&DatasetId::new("run-0").expect("dataset")];
        assert_eq!(run0[&nid("main")].inclusive_by_rank, vec![1.0, 2.0]);
        assert!(run0[&nid("main")].exclusive_by_rank.is_empty());
    }

    #[rstest]
    #[case::plain(r#""MPI_Allreduce""#)]
    #[case::wrapped(r#"["MPI_Allreduce"]"#)]
    fn names_are_normalized(#[case] name: &str) {
        let raw = format!(r#"{{"nodes": [{{"name": {name}}}], "edges": []}}"#);
        let input = parse_graph_json(&raw).expect("graph");
        assert_eq!(input.nodes[0].id().as_str(), "MPI_Allreduce");
        assert_eq!(input.nodes[0].name(), "MPI_Allreduce");
    }

    #[test]
    fn edges_is_an_alias_for_links() {
        let input = parse_graph_json(
            r#"{"nodes": [{"id": "a"}, {"id": "b"}], "edges": [{"source": "a", "target": "b", "weight": 1}]}"#,
        )
        .expect("graph");
        assert_eq!(input.edges.len(), 1);
        assert_eq!(input.edges[0].exc_weight(), 0.0);
    }

    #[test]
    fn rejects_malformed_nodes() {
        let err = parse_graph_json(r#"{"nodes": [{"name": ["a", "b"]}]}"#).unwrap_err();
        assert!(matches!(err, FormatError::AmbiguousName { index: 0, .. }));

        let err = parse_graph_json(r#"{"nodes": [{"module": "libc"}]}"#).unwrap_err();
        assert_eq!(err.to_string(), "node 0 has neither an id nor a name");

        let err = parse_graph_json(r#"{"nodes": [{"id": "  "}]}"#).unwrap_err();
        assert!(matches!(err, FormatError::InvalidId { field: "node id", .. }));

        let err = parse_graph_json("{ nope").unwrap_err();
        assert!(matches!(err, FormatError::Json { .. }));
    }

    #[test]
    fn document_carries_placements_and_origins() {
        let outcome = run_layout(&crate::model::fixtures::skip_level_input(), &LayoutConfig::default())
            .expect("layout");
        let document = layout_document(&outcome);

        assert_eq!(document.max_level, Some(3));
        assert_eq!(document.nodes.len(), 5);
        assert!(document.nodes.iter().all(|node| node.x.is_some() && node.height.is_some()));

        let synthetic = document
            .links
            .iter()
            .filter(|link| link.kind != "normal")
            .collect::<Vec<_>>();
        assert_eq!(synthetic.len(), 3);
        for link in synthetic {
            assert_eq!(link.original_source.as_deref(), Some("root"));
            assert_eq!(link.original_target.as_deref(), Some("leaf"));
            assert!(link.width.is_some());
        }

        let json = serde_json::to_value(&document).expect("json");
        assert_eq!(json["report"]["intermediate_nodes"][0], "intermediate_leaf_0");
    }

    #[test]
    fn schema_describes_the_document() {
        let schema = serde_json::to_value(layout_document_schema()).expect("schema json");
        let properties = &schema["properties"];
        for key in ["max_level", "nodes", "links", "report"] {
            assert!(properties.get(key).is_some(), "missing {key}");
        }
    }
}
