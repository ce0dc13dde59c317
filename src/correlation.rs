//! Correlation summarizer
//!
//! Turns the numeric columns of a [`Dataset`] into a long-form table with one
//! [`CorrelationRecord`] per ordered variable pair, which is exactly what a
//! heatmap-with-labels renderer consumes.
//!
//! ## Semantics
//!
//! - Only numeric columns take part, in dataset order. Fewer than two is an
//!   error rather than an empty result.
//! - Each pair uses its own pairwise-complete observations: a row missing in
//!   either column is skipped for that pair only.
//! - Undefined coefficients (zero variance, fewer than two observations) are
//!   NaN in the record. They never abort the summary.
//! - Records are row-major: all pairs of the first variable, then the second,
//!   and so on. N numeric columns give N² records.
//! - Labels have exactly two decimals. The coefficient is scaled by 100 and
//!   rounded half away from zero; `-0.00` is printed as `0.00`. NaN is
//!   labelled `nan`.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::dataset::Dataset;

/// Errors raised before any coefficient is computed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    #[error("Correlation needs at least 2 numeric columns, found {found}")]
    InsufficientData { found: usize },

    #[error("Invalid correlation method '{0}' (expected 'pearson' or 'spearman')")]
    InvalidMethod(String),
}

/// Coefficient formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    /// Linear, covariance based
    #[default]
    Pearson,
    /// Pearson on average ranks
    Spearman,
}

impl CorrelationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "pearson",
            CorrelationMethod::Spearman => "spearman",
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrelationMethod {
    type Err = CorrelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pearson" => Ok(CorrelationMethod::Pearson),
            "spearman" => Ok(CorrelationMethod::Spearman),
            _ => Err(CorrelationError::InvalidMethod(s.to_string())),
        }
    }
}

/// One cell of the tidy correlation table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationRecord {
    pub variable_a: String,
    pub variable_b: String,
    /// NaN (serialized as `null`) when undefined
    pub coefficient: f64,
    pub label: String,
}

/// Square coefficient matrix over the numeric columns
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    method: CorrelationMethod,
    variables: Vec<String>,
    /// Row-major, `variables.len()²` entries
    values: Vec<f64>,
}

impl CorrelationMatrix {
    pub fn method(&self) -> CorrelationMethod {
        self.method
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.variables.len() + col]
    }

    /// Flatten into row-major records
    pub fn to_records(&self) -> Vec<CorrelationRecord> {
        let n = self.variables.len();
        (0..n)
            .flat_map(|row| (0..n).map(move |col| (row, col)))
            .map(|(row, col)| {
                let coefficient = self.get(row, col);
                CorrelationRecord {
                    variable_a: self.variables[row].clone(),
                    variable_b: self.variables[col].clone(),
                    coefficient,
                    label: format_label(coefficient),
                }
            })
            .collect()
    }
}

/// Two-decimal label for a coefficient
pub fn format_label(coefficient: f64) -> String {
    if !coefficient.is_finite() {
        return "nan".to_string();
    }
    // Adding 0.0 turns -0.0 into 0.0
    let rounded = (coefficient * 100.0).round() / 100.0 + 0.0;
    format!("{:.2}", rounded)
}

/// Compute the coefficient matrix over all numeric columns
pub fn correlation_matrix(
    dataset: &Dataset,
    method: CorrelationMethod,
) -> Result<CorrelationMatrix, CorrelationError> {
    let numeric: Vec<(&str, &[Option<f64>])> = dataset
        .columns()
        .iter()
        .filter_map(|c| c.numeric_values().map(|values| (c.name(), values)))
        .collect();

    let n = numeric.len();
    if n < 2 {
        return Err(CorrelationError::InsufficientData { found: n });
    }

    // Upper triangle including the diagonal; mirrored below
    let pairs: Vec<(usize, usize)> = (0..n).flat_map(|i| (i..n).map(move |j| (i, j))).collect();
    let coefficients: Vec<f64> = pairs
        .par_iter()
        .map(|&(i, j)| {
            if i == j {
                self_correlation(numeric[i].1)
            } else {
                pairwise_coefficient(method, numeric[i].1, numeric[j].1)
            }
        })
        .collect();

    let mut values = vec![f64::NAN; n * n];
    for (&(i, j), &r) in pairs.iter().zip(&coefficients) {
        values[i * n + j] = r;
        values[j * n + i] = r;
    }

    debug!(method = %method, variables = n, "computed correlation matrix");

    Ok(CorrelationMatrix {
        method,
        variables: numeric.iter().map(|(name, _)| name.to_string()).collect(),
        values,
    })
}

/// Long-form correlation table for every ordered pair of numeric columns
pub fn summarize_correlation(
    dataset: &Dataset,
    method: CorrelationMethod,
) -> Result<Vec<CorrelationRecord>, CorrelationError> {
    correlation_matrix(dataset, method).map(|m| m.to_records())
}

/// 1.0 when the column varies, NaN otherwise; identical for both methods
fn self_correlation(values: &[Option<f64>]) -> f64 {
    let observed: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    if pearson(&observed, &observed).is_nan() {
        f64::NAN
    } else {
        1.0
    }
}

fn pairwise_coefficient(method: CorrelationMethod, x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .unzip();

    match method {
        CorrelationMethod::Pearson => pearson(&xs, &ys),
        CorrelationMethod::Spearman => pearson(&average_ranks(&xs), &average_ranks(&ys)),
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

/// Pearson coefficient of two equally long samples
fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len();
    if n < 2 || is_constant(xs) || is_constant(ys) {
        return f64::NAN;
    }

    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denominator = sxx.sqrt() * syy.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return f64::NAN;
    }

    // clamp keeps NaN as NaN
    (sxy / denominator).clamp(-1.0, 1.0)
}

/// 1-based ranks; ties share the mean of the ranks they span
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }

    ranks
}
