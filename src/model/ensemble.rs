// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::graph::Graph;
use super::ids::DatasetId;
use super::records::MetricRecord;

/// Writes the synthetic `ensemble` record for every normal node that has run data.
///
/// Scalar times take the maximum across runs; per-rank samples are concatenated in
/// dataset-id order so the ensemble distribution covers every rank of every run. An
/// existing ensemble record is replaced. Returns the number of nodes merged.
pub fn merge_ensemble(graph: &mut Graph) -> usize {
    let ensemble = DatasetId::ensemble();
    let mut merged = 0usize;

    for node in graph.nodes_mut() {
        if node.is_intermediate() {
            continue;
        }

        let mut runs =
            node.per_dataset().iter().filter(|(dataset, _)| !dataset.is_ensemble()).peekable();
        if runs.peek().is_none() {
            continue;
        }

        let mut record = MetricRecord::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (_, run) in runs {
            record.inclusive = record.inclusive.max(run.inclusive);
            record.exclusive = record.exclusive.max(run.exclusive);
            record.inclusive_by_rank.extend_from_slice(&run.inclusive_by_rank);
            record.exclusive_by_rank.extend_from_slice(&run.exclusive_by_rank);
        }

        node.insert_metrics(ensemble.clone(), record);
        merged += 1;
    }

    merged
}
