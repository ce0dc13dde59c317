//! Chart data for web visualization
//!
//! Converts analysis results to JSON-serializable chart data
//! consumed by the Vega-Lite frontend.

use serde::Serialize;

use crate::correlation::{CorrelationError, CorrelationMethod, CorrelationRecord, correlation_matrix};
use crate::dataset::Dataset;
use crate::profile::{MissingStat, ValueCount};

/// Default coefficient above which heatmap labels switch to white
pub const DEFAULT_LABEL_THRESHOLD: f64 = 0.5;

/// Correlation heatmap with per-cell labels
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapData {
    pub method: CorrelationMethod,
    /// Axis order for both axes
    pub variables: Vec<String>,
    pub cells: Vec<HeatmapCell>,
    pub label_threshold: f64,
}

/// A record plus the label colour the renderer should use
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapCell {
    #[serde(flatten)]
    pub record: CorrelationRecord,
    pub label_color: &'static str,
}

/// A single bar
#[derive(Debug, Clone, Serialize)]
pub struct Bar {
    pub category: String,
    pub value: f64,
}

/// Simple bar chart
#[derive(Debug, Clone, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<Bar>,
}

/// Label colour for a cell; NaN cells get the default (dark) label
pub fn label_color(coefficient: f64, threshold: f64) -> &'static str {
    if coefficient > threshold {
        "white"
    } else {
        "black"
    }
}

pub fn correlation_heatmap(
    dataset: &Dataset,
    method: CorrelationMethod,
    label_threshold: f64,
) -> Result<HeatmapData, CorrelationError> {
    let matrix = correlation_matrix(dataset, method)?;

    let cells = matrix
        .to_records()
        .into_iter()
        .map(|record| HeatmapCell {
            label_color: label_color(record.coefficient, label_threshold),
            record,
        })
        .collect();

    Ok(HeatmapData {
        method,
        variables: matrix.variables().to_vec(),
        cells,
        label_threshold,
    })
}

pub fn missing_values_chart(missing: &[MissingStat]) -> BarChart {
    BarChart {
        title: "Analysing NaN values".to_string(),
        x_label: "% NaN Values".to_string(),
        y_label: "Columns".to_string(),
        bars: missing
            .iter()
            .map(|m| Bar {
                category: m.column.clone(),
                value: m.percent,
            })
            .collect(),
    }
}

pub fn value_counts_chart(column: &str, counts: &[ValueCount]) -> BarChart {
    BarChart {
        title: format!("Value counts: {}", column),
        x_label: "Classes".to_string(),
        y_label: "Count".to_string(),
        bars: counts
            .iter()
            .map(|c| Bar {
                category: c.value.clone(),
                value: c.count as f64,
            })
            .collect(),
    }
}
