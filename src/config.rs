// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Tributary-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Tributary and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Request configuration.
//!
//! Every field has a documented default, so a config file only needs the fields it
//! changes. Configs are plain values passed into each request; nothing here is global.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ITERATIONS: usize = 32;
pub const DEFAULT_BIN_COUNT: usize = 20;

/// What to do with input edges whose source or target is not a known node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnknownEndpointPolicy {
    /// Fail the request.
    Reject,
    /// Drop the edge and report it.
    Drop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub node_width: f64,
    /// Vertical gap between stacked nodes of one level.
    pub node_padding: f64,
    /// Barycenter relaxation passes.
    pub iterations: usize,
    /// Minimum rendered node height, so tiny flows stay visible and clickable.
    pub min_node_scale: f64,
    /// Flow that maps to the full usable height; defaults to the total flow of level 0.
    pub reference_value: Option<f64>,
    /// Stop relaxing early once no node moves further than this.
    pub convergence_epsilon: Option<f64>,
    pub unknown_endpoints: UnknownEndpointPolicy,
    /// Build the `ensemble` dataset from the run overlays before layout.
    pub merge_ensemble: bool,
    /// Drop call sites whose inclusive time is not above this percentage of the largest.
    pub filter_percent: Option<f64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1000.0,
            canvas_height: 600.0,
            node_width: 50.0,
            node_padding: 20.0,
            iterations: DEFAULT_ITERATIONS,
            min_node_scale: 4.0,
            reference_value: None,
            convergence_epsilon: None,
            unknown_endpoints: UnknownEndpointPolicy::Drop,
            merge_ensemble: true,
            filter_percent: None,
        }
    }
}

impl LayoutConfig {
    pub fn with_canvas(mut self, width: f64, height: f64) -> Self {
        self.canvas_width = width;
        self.canvas_height = height;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|source| ConfigError::Json { source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("canvas_width", self.canvas_width)?;
        positive("canvas_height", self.canvas_height)?;
        non_negative("node_width", self.node_width)?;
        non_negative("node_padding", self.node_padding)?;
        non_negative("min_node_scale", self.min_node_scale)?;
        if let Some(reference) = self.reference_value {
            positive("reference_value", reference)?;
        }
        if let Some(epsilon) = self.convergence_epsilon {
            positive("convergence_epsilon", epsilon)?;
        }
        if let Some(percent) = self.filter_percent {
            if !(0.0..=100.0).contains(&percent) {
                return Err(ConfigError::Invalid {
                    field: "filter_percent",
                    value: percent,
                    expected: "a percentage between 0 and 100",
                });
            }
        }
        if self.node_width >= self.canvas_width {
            return Err(ConfigError::Invalid {
                field: "node_width",
                value: self.node_width,
                expected: "less than canvas_width",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct HistogramConfig {
    pub bin_count: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self { bin_count: DEFAULT_BIN_COUNT }
    }
}

impl HistogramConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bin_count == 0 {
            return Err(ConfigError::ZeroBins);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid { field: &'static str, value: f64, expected: &'static str },
    ZeroBins,
    Json { source: serde_json::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { field, value, expected } => {
                write!(f, "invalid {field} {value}: expected {expected}")
            }
            Self::ZeroBins => f.write_str("bin_count must be at least 1"),
            Self::Json { source } => write!(f, "invalid config JSON: {source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json { source } => Some(source),
            _ => None,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        return Ok(());
    }
    Err(ConfigError::Invalid { field, value, expected: "a positive finite number" })
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        return Ok(());
    }
    Err(ConfigError::Invalid { field, value, expected: "a non-negative finite number" })
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, HistogramConfig, LayoutConfig, UnknownEndpointPolicy};

    #[test]
    fn defaults_are_valid() {
        let config = LayoutConfig::default();
        assert_eq!(config.iterations, 32);
        assert_eq!(config.unknown_endpoints, UnknownEndpointPolicy::Drop);
        config.validate().expect("default layout config");
        assert_eq!(HistogramConfig::default().bin_count, 20);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = LayoutConfig::from_json_str(
            r#"{ "canvas_height": 900, "iterations": 8, "unknown_endpoints": "reject" }"#,
        )
        .expect("config");
        assert_eq!(config.canvas_height, 900.0);
        assert_eq!(config.canvas_width, 1000.0);
        assert_eq!(config.iterations, 8);
        assert_eq!(config.unknown_endpoints, UnknownEndpointPolicy::Reject);
    }

    #[test]
    fn rejects_unknown_fields_and_bad_values() {
        let err = LayoutConfig::from_json_str(r#"{ "canvas_hieght": 900 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));

        let err = LayoutConfig::default().with_canvas(0.0, 600.0).validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid canvas_width 0: expected a positive finite number");

        let err = LayoutConfig::default().with_canvas(40.0, 600.0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "node_width", .. }));

        let config = LayoutConfig { filter_percent: Some(150.0), ..LayoutConfig::default() };
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid filter_percent 150: expected a percentage between 0 and 100");
        let config = LayoutConfig { filter_percent: Some(f64::NAN), ..LayoutConfig::default() };
        assert!(config.validate().is_err());

        let err = HistogramConfig { bin_count: 0 }.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ZeroBins));
    }
}
