// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Tributary CLI entrypoint.
//!
//! Reads a call graph JSON file, lays it out and prints the layout document (or a batch of
//! per-node histograms) as JSON on stdout.

use std::error::Error;

use tributary::config::{HistogramConfig, LayoutConfig};
use tributary::distribution::{node_histograms, Metric};
use tributary::format::{
    histograms_document, layout_document, layout_document_schema, parse_graph_json,
};
use tributary::model::DatasetId;
use tributary::pipeline::run_layout;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} <graph.json> [--config <config.json>] [--width <px>] [--height <px>] [--iterations <n>] [--filter <percent>]\n  {program} <graph.json> --histograms <dataset> <inclusive|exclusive> [--bins <n>]\n  {program} --schema\n\nPrints the laid-out graph as JSON on stdout.\n--config loads layout settings; --width/--height/--iterations/--filter override them.\n--filter drops call sites whose inclusive time is not above <percent>% of the largest.\n--histograms prints per-node distributions for one dataset instead (use `ensemble` for all runs).\n--schema prints the JSON Schema of the layout document."
    );
}

#[derive(Debug, Default, Clone, PartialEq)]
struct CliOptions {
    graph_path: Option<String>,
    config_path: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
    iterations: Option<usize>,
    filter_percent: Option<f64>,
    histograms: Option<(String, Metric)>,
    bins: Option<usize>,
    schema: bool,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                if options.config_path.is_some() {
                    return Err(());
                }
                options.config_path = Some(args.next().ok_or(())?);
            }
            "--width" => {
                if options.width.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.width = Some(raw.parse().map_err(|_| ())?);
            }
            "--height" => {
                if options.height.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.height = Some(raw.parse().map_err(|_| ())?);
            }
            "--iterations" => {
                if options.iterations.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.iterations = Some(raw.parse().map_err(|_| ())?);
            }
            "--filter" => {
                if options.filter_percent.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.filter_percent = Some(raw.parse().map_err(|_| ())?);
            }
            "--histograms" => {
                if options.histograms.is_some() {
                    return Err(());
                }
                let dataset = args.next().ok_or(())?;
                let metric = args.next().as_deref().and_then(Metric::from_name).ok_or(())?;
                options.histograms = Some((dataset, metric));
            }
            "--bins" => {
                if options.bins.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.bins = Some(raw.parse().map_err(|_| ())?);
            }
            "--schema" => {
                if options.schema {
                    return Err(());
                }
                options.schema = true;
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.graph_path.is_some() {
                    return Err(());
                }
                options.graph_path = Some(arg);
            }
        }
    }

    if options.schema {
        return if options == (CliOptions { schema: true, ..CliOptions::default() }) {
            Ok(options)
        } else {
            Err(())
        };
    }
    if options.graph_path.is_none() {
        return Err(());
    }
    if options.bins.is_some() && options.histograms.is_none() {
        return Err(());
    }

    Ok(options)
}

fn layout_config(options: &CliOptions) -> Result<LayoutConfig, Box<dyn Error>> {
    let mut config = match &options.config_path {
        Some(path) => LayoutConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => LayoutConfig::default(),
    };
    if let Some(width) = options.width {
        config.canvas_width = width;
    }
    if let Some(height) = options.height {
        config.canvas_height = height;
    }
    if let Some(iterations) = options.iterations {
        config.iterations = iterations;
    }
    if let Some(percent) = options.filter_percent {
        config.filter_percent = Some(percent);
    }
    Ok(config)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "tributary".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        if options.schema {
            println!("{}", serde_json::to_string_pretty(&layout_document_schema())?);
            return Ok(());
        }

        let graph_path = options.graph_path.as_deref().unwrap_or_default();
        let input = parse_graph_json(&std::fs::read_to_string(graph_path)?)?;
        let config = layout_config(&options)?;
        let outcome = run_layout(&input, &config)?;

        let report = &outcome.report;
        if !report.dropped_edges.is_empty() {
            eprintln!("tributary: dropped {} edge(s) with unknown endpoints", report.dropped_edges.len());
        }
        if !report.pruned_nodes.is_empty() {
            eprintln!(
                "tributary: filtered out {} call site(s) and {} edge(s)",
                report.pruned_nodes.len(),
                report.pruned_edges
            );
        }
        for warning in &report.disconnected_edges {
            eprintln!("tributary: {warning}");
        }

        let json = match &options.histograms {
            Some((dataset, metric)) => {
                let histogram_config =
                    HistogramConfig { bin_count: options.bins.unwrap_or(HistogramConfig::default().bin_count) };
                histogram_config.validate()?;
                let dataset = DatasetId::new(dataset)?;
                let batch =
                    node_histograms(&outcome.graph, &dataset, *metric, histogram_config.bin_count)?;
                for (node_id, err) in &batch.failed {
                    eprintln!("tributary: skipped histogram of {node_id}: {err}");
                }
                serde_json::to_string_pretty(&histograms_document(
                    &batch,
                    &dataset,
                    *metric,
                    histogram_config.bin_count,
                ))?
            }
            None => serde_json::to_string_pretty(&layout_document(&outcome))?,
        };
        println!("{json}");

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("tributary: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use tributary::distribution::Metric;

    use super::{parse_options, CliOptions};

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values.iter().map(|value| (*value).to_owned()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_graph_path() {
        let options = parse_options(args(&["graph.json"])).expect("parse options");
        assert_eq!(
            options,
            CliOptions { graph_path: Some("graph.json".to_owned()), ..CliOptions::default() }
        );
    }

    #[test]
    fn parses_overrides_in_any_order() {
        let options = parse_options(args(&[
            "--width",
            "1200",
            "graph.json",
            "--iterations",
            "8",
            "--height",
            "480.5",
            "--filter",
            "12.5",
        ]))
        .expect("parse options");
        assert_eq!(options.graph_path.as_deref(), Some("graph.json"));
        assert_eq!(options.width, Some(1200.0));
        assert_eq!(options.height, Some(480.5));
        assert_eq!(options.iterations, Some(8));
        assert_eq!(options.filter_percent, Some(12.5));
    }

    #[test]
    fn parses_histogram_request() {
        let options =
            parse_options(args(&["graph.json", "--histograms", "ensemble", "exclusive", "--bins", "10"]))
                .expect("parse options");
        assert_eq!(options.histograms, Some(("ensemble".to_owned(), Metric::Exclusive)));
        assert_eq!(options.bins, Some(10));
    }

    #[test]
    fn schema_stands_alone() {
        let options = parse_options(args(&["--schema"])).expect("parse options");
        assert!(options.schema);
        parse_options(args(&["--schema", "graph.json"])).unwrap_err();
    }

    #[test]
    fn rejects_bad_usage() {
        parse_options(args(&[])).unwrap_err();
        parse_options(args(&["one.json", "two.json"])).unwrap_err();
        parse_options(args(&["graph.json", "--nope"])).unwrap_err();
        parse_options(args(&["graph.json", "--width"])).unwrap_err();
        parse_options(args(&["graph.json", "--width", "wide"])).unwrap_err();
        parse_options(args(&["graph.json", "--iterations", "1", "--iterations", "2"])).unwrap_err();
        parse_options(args(&["graph.json", "--histograms", "run-0", "median"])).unwrap_err();
        parse_options(args(&["graph.json", "--bins", "4"])).unwrap_err();
        parse_options(args(&["graph.json", "--filter", "most"])).unwrap_err();
    }
}
