//! Per-column profiling
//!
//! Missing-value statistics, value counts, describe-style summaries and
//! histograms. These are the building blocks of every dashboard section except
//! correlation.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::dataset::{Column, ColumnData, Dataset, DtypeEntry, Shape};

/// Upper bound on automatically chosen histogram bins
pub const MAX_AUTO_BINS: usize = 50;

/// Upper bound on an explicitly requested bin count
pub const MAX_BINS: usize = 1000;

/// Errors that can occur while profiling a column
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("Column '{0}' has no observed values")]
    NoObservations(String),

    #[error("Histogram needs at least one bin")]
    ZeroBins,

    #[error("Histogram supports at most {max} bins, got {requested}")]
    TooManyBins { requested: usize, max: usize },
}

/// Look up a column by name
pub fn find_column<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a Column, ProfileError> {
    dataset
        .column(name)
        .ok_or_else(|| ProfileError::UnknownColumn(name.to_string()))
}

/// Missing-value statistics for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingStat {
    pub column: String,
    pub missing: usize,
    /// Share of missing cells, 0-100 (NaN when the dataset has no rows)
    pub percent: f64,
}

/// Shape, dtypes and missing values in one bundle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub shape: Shape,
    pub dtypes: Vec<DtypeEntry>,
    pub missing: Vec<MissingStat>,
}

pub fn overview(dataset: &Dataset) -> Overview {
    Overview {
        shape: dataset.shape(),
        dtypes: dataset.dtypes(),
        missing: missing_values(dataset),
    }
}

pub fn missing_values(dataset: &Dataset) -> Vec<MissingStat> {
    let rows = dataset.row_count();

    dataset
        .columns()
        .iter()
        .map(|column| {
            let missing = column.missing_count();
            let percent = if rows == 0 {
                f64::NAN
            } else {
                missing as f64 / rows as f64 * 100.0
            };
            MissingStat {
                column: column.name().to_string(),
                missing,
                percent,
            }
        })
        .collect()
}

/// A distinct value and how often it occurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Distinct observed values, most frequent first; ties keep first-seen order
pub fn value_counts(column: &Column) -> Vec<ValueCount> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<ValueCount> = Vec::new();

    for value in column.observed_display_values() {
        match index.get(&value) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(value.clone(), counts.len());
                counts.push(ValueCount { value, count: 1 });
            }
        }
    }

    // sort_by is stable
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Summary statistics of a numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    #[serde(rename = "25%")]
    pub q25: f64,
    #[serde(rename = "50%")]
    pub median: f64,
    #[serde(rename = "75%")]
    pub q75: f64,
    pub max: f64,
}

/// Summary of a non-numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Description {
    Numeric(NumericSummary),
    Categorical(CategoricalSummary),
}

impl Description {
    /// (statistic, value) rows for tabular display
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        match self {
            Description::Numeric(s) => vec![
                ("count", s.count.to_string()),
                ("mean", format_stat(s.mean)),
                ("std", format_stat(s.std)),
                ("min", format_stat(s.min)),
                ("25%", format_stat(s.q25)),
                ("50%", format_stat(s.median)),
                ("75%", format_stat(s.q75)),
                ("max", format_stat(s.max)),
            ],
            Description::Categorical(s) => vec![
                ("count", s.count.to_string()),
                ("unique", s.unique.to_string()),
                ("top", s.top.clone().unwrap_or_else(|| "NaN".to_string())),
                (
                    "freq",
                    s.freq
                        .map(|f| f.to_string())
                        .unwrap_or_else(|| "NaN".to_string()),
                ),
            ],
        }
    }
}

fn format_stat(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.6}", value)
    }
}

pub fn describe(column: &Column) -> Description {
    match column.data() {
        ColumnData::Numeric { values, .. } => {
            let observed: Vec<f64> = values.iter().flatten().copied().collect();
            Description::Numeric(numeric_summary(&observed))
        }
        _ => {
            let counts = value_counts(column);
            let top = counts.first();
            Description::Categorical(CategoricalSummary {
                count: column.len() - column.missing_count(),
                unique: counts.len(),
                top: top.map(|c| c.value.clone()),
                freq: top.map(|c| c.count),
            })
        }
    }
}

fn numeric_summary(observed: &[f64]) -> NumericSummary {
    let count = observed.len();
    let mut sorted = observed.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mean = if count == 0 {
        f64::NAN
    } else {
        observed.iter().sum::<f64>() / count as f64
    };

    // Sample standard deviation (ddof = 1)
    let std = if count < 2 {
        f64::NAN
    } else {
        let ss: f64 = observed.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    };

    NumericSummary {
        count,
        mean,
        std,
        min: sorted.first().copied().unwrap_or(f64::NAN),
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted.last().copied().unwrap_or(f64::NAN),
    }
}

/// Linear-interpolation quantile of sorted data
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// One histogram bin, `[start, end)` except the last which is closed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub column: String,
    pub bins: Vec<HistogramBin>,
    /// Mean of the binned values, drawn as a rule by the renderer
    pub mean: f64,
    pub count: usize,
}

/// Equal-width histogram of the finite values of a numeric column
pub fn histogram(column: &Column, bins: Option<usize>) -> Result<Histogram, ProfileError> {
    let values = column
        .numeric_values()
        .ok_or_else(|| ProfileError::NotNumeric(column.name().to_string()))?;

    let mut sorted: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return Err(ProfileError::NoObservations(column.name().to_string()));
    }
    sorted.sort_by(f64::total_cmp);

    let bin_count = match bins {
        Some(0) => return Err(ProfileError::ZeroBins),
        Some(n) if n > MAX_BINS => {
            return Err(ProfileError::TooManyBins {
                requested: n,
                max: MAX_BINS,
            });
        }
        Some(n) => n,
        None => auto_bin_count(&sorted),
    };

    let (mut lo, mut hi) = (sorted[0], sorted[sorted.len() - 1]);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bin_count as f64;

    let mut counts = vec![0usize; bin_count];
    for v in &sorted {
        let idx = (((v - lo) / width).floor() as usize).min(bin_count - 1);
        counts[idx] += 1;
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: lo + width * i as f64,
            end: if i + 1 == bin_count {
                hi
            } else {
                lo + width * (i + 1) as f64
            },
            count,
        })
        .collect();

    Ok(Histogram {
        column: column.name().to_string(),
        bins,
        mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
        count: sorted.len(),
    })
}

/// Freedman-Diaconis bin count, falling back to the square-root rule
fn auto_bin_count(sorted: &[f64]) -> usize {
    let n = sorted.len() as f64;
    let range = sorted[sorted.len() - 1] - sorted[0];
    let iqr = quantile(sorted, 0.75) - quantile(sorted, 0.25);

    let bins = if iqr > 0.0 && range > 0.0 {
        let width = 2.0 * iqr / n.cbrt();
        (range / width).ceil()
    } else {
        n.sqrt().ceil()
    };

    (bins as usize).clamp(1, MAX_AUTO_BINS)
}
