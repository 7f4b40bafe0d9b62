// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Binned distributions of per-rank metric samples.
//!
//! Histograms are computed on request and never cached: the caller owns the returned
//! value. A node's samples come from its per-dataset [`MetricRecord`]; the `ensemble`
//! dataset (see [`crate::model::merge_ensemble`]) holds all runs together, which is what
//! [`compare`] bins a single run against.

use std::collections::BTreeMap;
use std::fmt;

use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{DatasetId, Graph, MetricRecord, NodeId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Histogram {
    bins: Vec<f64>,
    freq: Vec<u64>,
    min: f64,
    max: f64,
}

impl Histogram {
    /// Left boundary of each bin.
    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    pub fn freq(&self) -> &[u64] {
        &self.freq
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn bin_count(&self) -> usize {
        self.freq.len()
    }

    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.freq.len() as f64
    }

    /// All `bin_count + 1` boundaries, ending at `max`.
    pub fn edges(&self) -> Vec<f64> {
        let mut edges = self.bins.clone();
        edges.push(self.max);
        edges
    }

    /// Number of samples binned.
    pub fn total(&self) -> u64 {
        self.freq.iter().sum()
    }

    /// Largest single-bin count.
    pub fn peak(&self) -> u64 {
        self.freq.iter().copied().max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistogramError {
    EmptySamples,
    ZeroBins,
    NonFiniteSample { index: usize, value: f64 },
    InvalidRange { min: f64, max: f64 },
}

impl fmt::Display for HistogramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySamples => f.write_str("cannot bin an empty sample"),
            Self::ZeroBins => f.write_str("bin count must be at least 1"),
            Self::NonFiniteSample { index, value } => {
                write!(f, "sample {index} is not a finite number: {value}")
            }
            Self::InvalidRange { min, max } => write!(f, "invalid histogram range [{min}, {max}]"),
        }
    }
}

impl std::error::Error for HistogramError {}

fn check_finite(samples: &[f64]) -> Result<(), HistogramError> {
    if samples.is_empty() {
        return Err(HistogramError::EmptySamples);
    }
    if let Some((index, &value)) = samples.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(HistogramError::NonFiniteSample { index, value });
    }
    Ok(())
}

fn check_samples(samples: &[f64], bin_count: usize) -> Result<(), HistogramError> {
    if bin_count == 0 {
        return Err(HistogramError::ZeroBins);
    }
    check_finite(samples)
}

/// Bins `samples` into `bin_count` equal-width bins spanning the sample range.
///
/// A zero-width range (all samples equal) puts everything into the first bin.
pub fn histogram(samples: &[f64], bin_count: usize) -> Result<Histogram, HistogramError> {
    check_samples(samples, bin_count)?;

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];

    Ok(bin(&sorted, bin_count, min, max))
}

/// Bins `samples` on a fixed `[min, max]` range; samples outside it land in the end bins.
pub fn histogram_in_range(
    samples: &[f64],
    bin_count: usize,
    min: f64,
    max: f64,
) -> Result<Histogram, HistogramError> {
    check_samples(samples, bin_count)?;
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(HistogramError::InvalidRange { min, max });
    }
    Ok(bin(samples, bin_count, min, max))
}

fn bin(samples: &[f64], bin_count: usize, min: f64, max: f64) -> Histogram {
    let width = (max - min) / bin_count as f64;
    let bins = (0..bin_count).map(|idx| min + idx as f64 * width).collect::<Vec<_>>();

    let mut freq = vec![0u64; bin_count];
    for &value in samples {
        let idx = if width > 0.0 {
            (((value - min) / width).floor().max(0.0) as usize).min(bin_count - 1)
        } else {
            0
        };
        freq[idx] += 1;
    }

    Histogram { bins, freq, min, max }
}

/// Largest single-bin count across `histograms`, for a shared y-scale.
pub fn global_max<'a>(histograms: impl IntoIterator<Item = &'a Histogram>) -> u64 {
    histograms.into_iter().map(Histogram::peak).max().unwrap_or(0)
}

/// Samples further than this many interquartile ranges outside the box are outliers.
const OUTLIER_FENCE: f64 = 1.5;

/// Five-number summary of a sample with per-sample outlier flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoxPlot {
    /// Minimum, first quartile, median, third quartile and maximum.
    quartiles: [f64; 5],
    /// One flag per input sample, in input order.
    outliers: Vec<bool>,
}

impl BoxPlot {
    pub fn quartiles(&self) -> [f64; 5] {
        self.quartiles
    }

    pub fn min(&self) -> f64 {
        self.quartiles[0]
    }

    pub fn q1(&self) -> f64 {
        self.quartiles[1]
    }

    pub fn median(&self) -> f64 {
        self.quartiles[2]
    }

    pub fn q3(&self) -> f64 {
        self.quartiles[3]
    }

    pub fn max(&self) -> f64 {
        self.quartiles[4]
    }

    pub fn iqr(&self) -> f64 {
        self.q3() - self.q1()
    }

    pub fn outliers(&self) -> &[bool] {
        &self.outliers
    }

    pub fn outlier_count(&self) -> usize {
        self.outliers.iter().filter(|&&flag| flag).count()
    }
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Quartiles of `samples` and which samples fall outside `[q1 - 1.5 iqr, q3 + 1.5 iqr]`.
pub fn boxplot(samples: &[f64]) -> Result<BoxPlot, HistogramError> {
    check_finite(samples)?;

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let quartiles = [0.0, 0.25, 0.5, 0.75, 1.0].map(|q| quantile(&sorted, q));

    let fence = (quartiles[3] - quartiles[1]) * OUTLIER_FENCE;
    let (lower, upper) = (quartiles[1] - fence, quartiles[3] + fence);
    let outliers = samples.iter().map(|&value| value < lower || value > upper).collect();

    Ok(BoxPlot { quartiles, outliers })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Inclusive,
    Exclusive,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inclusive => "inclusive",
            Self::Exclusive => "exclusive",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value {
            "inclusive" => Some(Self::Inclusive),
            "exclusive" => Some(Self::Exclusive),
            _ => None,
        }
    }

    /// The per-rank samples this metric selects.
    pub fn samples(self, record: &MetricRecord) -> &[f64] {
        match self {
            Self::Inclusive => &record.inclusive_by_rank,
            Self::Exclusive => &record.exclusive_by_rank,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DistributionError {
    ZeroBins,
    UnknownNode {
        node_id: NodeId,
    },
    MissingDataset {
        node_id: NodeId,
        dataset: DatasetId,
    },
    Histogram {
        node_id: NodeId,
        dataset: DatasetId,
        metric: Metric,
        source: Box<HistogramError>,
    },
}

impl fmt::Display for DistributionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBins => f.write_str("bin count must be at least 1"),
            Self::UnknownNode { node_id } => write!(f, "unknown node: {node_id}"),
            Self::MissingDataset { node_id, dataset } => {
                write!(f, "node {node_id} has no samples for dataset {dataset}")
            }
            Self::Histogram { node_id, dataset, metric, source } => {
                write!(f, "cannot bin {metric} samples of {node_id} in {dataset}: {source}")
            }
        }
    }
}

impl std::error::Error for DistributionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Histogram { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

fn record<'a>(
    graph: &'a Graph,
    node_id: &NodeId,
    dataset: &DatasetId,
) -> Result<&'a MetricRecord, DistributionError> {
    let node = graph
        .node(node_id)
        .ok_or_else(|| DistributionError::UnknownNode { node_id: node_id.clone() })?;
    node.metrics(dataset).ok_or_else(|| DistributionError::MissingDataset {
        node_id: node_id.clone(),
        dataset: dataset.clone(),
    })
}

fn with_context(
    node_id: &NodeId,
    dataset: &DatasetId,
    metric: Metric,
) -> impl FnOnce(HistogramError) -> DistributionError {
    let node_id = node_id.clone();
    let dataset = dataset.clone();
    move |source| DistributionError::Histogram {
        node_id,
        dataset,
        metric,
        source: Box::new(source),
    }
}

pub fn node_histogram(
    graph: &Graph,
    node_id: &NodeId,
    dataset: &DatasetId,
    metric: Metric,
    bin_count: usize,
) -> Result<Histogram, DistributionError> {
    let record = record(graph, node_id, dataset)?;
    histogram(metric.samples(record), bin_count).map_err(with_context(node_id, dataset, metric))
}

pub fn node_boxplot(
    graph: &Graph,
    node_id: &NodeId,
    dataset: &DatasetId,
    metric: Metric,
) -> Result<BoxPlot, DistributionError> {
    let record = record(graph, node_id, dataset)?;
    boxplot(metric.samples(record)).map_err(with_context(node_id, dataset, metric))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeHistograms {
    pub histograms: BTreeMap<NodeId, Histogram>,
    /// Nodes with no record or no samples for the dataset.
    pub skipped: Vec<NodeId>,
    /// Nodes whose samples could not be binned.
    pub failed: Vec<(NodeId, HistogramError)>,
}

impl NodeHistograms {
    /// Shared y-scale for the whole batch.
    pub fn global_max(&self) -> u64 {
        global_max(self.histograms.values())
    }
}

/// Bins one metric for every normal node of `graph`, in parallel.
///
/// A node whose samples cannot be binned is listed in `failed`; the rest of the batch
/// still completes.
pub fn node_histograms(
    graph: &Graph,
    dataset: &DatasetId,
    metric: Metric,
    bin_count: usize,
) -> Result<NodeHistograms, DistributionError> {
    if bin_count == 0 {
        return Err(DistributionError::ZeroBins);
    }

    let mut out = NodeHistograms::default();
    let mut work = Vec::<(&NodeId, &[f64])>::new();
    for node in graph.nodes().values().filter(|node| !node.is_intermediate()) {
        match node.metrics(dataset).map(|record| metric.samples(record)) {
            Some(samples) if !samples.is_empty() => work.push((node.id(), samples)),
            _ => out.skipped.push(node.id().clone()),
        }
    }

    let binned = work
        .par_iter()
        .map(|(node_id, samples)| (*node_id, histogram(samples, bin_count)))
        .collect::<Vec<_>>();

    for (node_id, result) in binned {
        match result {
            Ok(histogram) => {
                out.histograms.insert(node_id.clone(), histogram);
            }
            Err(err) => {
                tracing::warn!(%node_id, %dataset, metric = metric.as_str(), %err, "cannot bin node samples");
                out.failed.push((node_id.clone(), err));
            }
        }
    }

    tracing::debug!(
        dataset = %dataset,
        metric = metric.as_str(),
        binned = out.histograms.len(),
        skipped = out.skipped.len(),
        failed = out.failed.len(),
        "binned node histograms"
    );

    Ok(out)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub ensemble: Histogram,
    /// Binned on the ensemble's range.
    pub target: Histogram,
    /// `mean(target) - mean(ensemble)`.
    pub mean_difference: f64,
}

/// Bins `target`'s samples of one node on the range of the node's ensemble samples.
pub fn compare(
    graph: &Graph,
    node_id: &NodeId,
    target: &DatasetId,
    metric: Metric,
    bin_count: usize,
) -> Result<Comparison, DistributionError> {
    let ensemble_id = DatasetId::ensemble();
    let ensemble_samples = metric.samples(record(graph, node_id, &ensemble_id)?);
    let target_samples = metric.samples(record(graph, node_id, target)?);

    let ensemble = histogram(ensemble_samples, bin_count)
        .map_err(with_context(node_id, &ensemble_id, metric))?;
    let target_hist =
        histogram_in_range(target_samples, bin_count, ensemble.min(), ensemble.max())
            .map_err(with_context(node_id, target, metric))?;

    let mean = |samples: &[f64]| samples.iter().sum::<f64>() / samples.len() as f64;
    let mean_difference = mean(target_samples) - mean(ensemble_samples);

    Ok(Comparison { ensemble, target: target_hist, mean_difference })
}
