//! Configuration file support for csv-eda
//!
//! This module handles parsing and applying `.eda.toml` configuration files
//! that set CSV reading options and dashboard defaults.
//!
//! ## Configuration File Format
//!
//! ```toml
//! # .eda.toml
//!
//! [csv]
//! # Field delimiter: "," (default) or ";"
//! separator = ";"
//!
//! # Extra tokens read as missing values (on top of "", "NA", "NaN", "null", ...)
//! missing_values = ["-", "?"]
//!
//! [analysis]
//! # Columns dropped right after loading (glob patterns on column names)
//! exclude_columns = ["id", "*_code"]
//!
//! # Rows shown in the data preview
//! preview_rows = 5
//!
//! [correlation]
//! # "pearson" or "spearman"
//! method = "spearman"
//!
//! [chart]
//! # Heatmap labels are drawn white above this coefficient, black otherwise
//! label_threshold = 0.5
//!
//! # Fixed histogram bin count, 1 to 1000 (automatic when omitted)
//! histogram_bins = 20
//! ```

use glob::Pattern;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::correlation::CorrelationMethod;
use crate::dataset::{CsvOptions, Dataset, parse_delimiter};
use crate::profile::MAX_BINS;
use crate::web::chart::DEFAULT_LABEL_THRESHOLD;

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid glob pattern: {0}")]
    PatternError(String),

    #[error("Invalid separator '{0}': expected a single ASCII character")]
    InvalidSeparator(String),

    #[error("Invalid histogram_bins {0}: expected 1 to {max}", max = MAX_BINS)]
    InvalidBins(usize),
}

/// CSV reading section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CsvConfig {
    /// Field delimiter
    #[serde(default)]
    pub separator: Option<String>,

    /// Extra missing-value tokens
    #[serde(default)]
    pub missing_values: Vec<String>,
}

/// Analysis configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Column name patterns to drop after loading
    #[serde(default)]
    pub exclude_columns: Vec<String>,

    /// Rows shown in the data preview
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

fn default_preview_rows() -> usize {
    5
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            exclude_columns: Vec::new(),
            preview_rows: default_preview_rows(),
        }
    }
}

/// Correlation section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CorrelationConfig {
    #[serde(default)]
    pub method: CorrelationMethod,
}

/// Chart rendering section
#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    /// Label contrast threshold for the correlation heatmap
    #[serde(default = "default_label_threshold")]
    pub label_threshold: f64,

    /// Fixed histogram bin count
    #[serde(default)]
    pub histogram_bins: Option<usize>,
}

fn default_label_threshold() -> f64 {
    DEFAULT_LABEL_THRESHOLD
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            label_threshold: default_label_threshold(),
            histogram_bins: None,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EdaConfig {
    #[serde(default)]
    pub csv: CsvConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub correlation: CorrelationConfig,

    #[serde(default)]
    pub chart: ChartConfig,
}

/// Validated configuration, ready to use
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    /// Options for reading CSV input
    pub csv: CsvOptions,
    /// Patterns for columns to drop
    exclude_patterns: Vec<Pattern>,
    /// Rows shown in the data preview
    pub preview_rows: usize,
    /// Default correlation method
    pub method: CorrelationMethod,
    /// Heatmap label contrast threshold
    pub label_threshold: f64,
    /// Fixed histogram bin count
    pub histogram_bins: Option<usize>,
}

impl CompiledConfig {
    /// Create a compiled config from raw config
    pub fn from_config(config: EdaConfig) -> Result<Self, ConfigError> {
        let exclude_patterns = config
            .analysis
            .exclude_columns
            .iter()
            .map(|p| Pattern::new(p).map_err(|e| ConfigError::PatternError(format!("{}: {}", p, e))))
            .collect::<Result<Vec<_>, _>>()?;

        let mut csv = CsvOptions::default().with_missing_tokens(config.csv.missing_values);
        if let Some(separator) = &config.csv.separator {
            csv.delimiter = parse_delimiter(separator)
                .ok_or_else(|| ConfigError::InvalidSeparator(separator.clone()))?;
        }

        if let Some(bins) = config.chart.histogram_bins.filter(|b| *b == 0 || *b > MAX_BINS) {
            return Err(ConfigError::InvalidBins(bins));
        }

        Ok(Self {
            csv,
            exclude_patterns,
            preview_rows: config.analysis.preview_rows,
            method: config.correlation.method,
            label_threshold: config.chart.label_threshold,
            histogram_bins: config.chart.histogram_bins,
        })
    }

    /// Create an empty config (all defaults)
    pub fn empty() -> Self {
        Self {
            csv: CsvOptions::default(),
            exclude_patterns: Vec::new(),
            preview_rows: default_preview_rows(),
            method: CorrelationMethod::default(),
            label_threshold: default_label_threshold(),
            histogram_bins: None,
        }
    }

    /// Check if a column should be dropped after loading
    pub fn should_exclude_column(&self, name: &str) -> bool {
        self.exclude_patterns.iter().any(|p| p.matches(name))
    }

    /// Drop excluded columns; returns how many were removed
    pub fn apply_exclusions(&self, dataset: &mut Dataset) -> usize {
        if self.exclude_patterns.is_empty() {
            return 0;
        }
        dataset.retain_columns(|c| !self.should_exclude_column(c.name()))
    }
}

/// Load configuration for a dataset or directory
///
/// An explicit file is read directly. Otherwise `.eda.toml` is searched for in
/// the given directory and its parents.
pub fn load_config(path: &Path) -> Result<EdaConfig, ConfigError> {
    let config_path = if path.is_file() && path.extension().is_some_and(|e| e == "toml") {
        Some(path.to_path_buf())
    } else {
        find_config_file(path)
    };

    match config_path {
        Some(path) => read_config_file(&path),
        None => Ok(EdaConfig::default()),
    }
}

/// Read a configuration file whatever its name
pub fn read_config_file(path: &Path) -> Result<EdaConfig, ConfigError> {
    debug!(path = %path.display(), "loading configuration");
    let content = fs::read_to_string(path)?;
    let config: EdaConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Find the config file by searching up the directory tree
fn find_config_file(start_path: &Path) -> Option<PathBuf> {
    let config_names = [".eda.toml", "eda.toml"];

    let mut current = if start_path.is_file() {
        start_path.parent()?.to_path_buf()
    } else {
        start_path.to_path_buf()
    };

    loop {
        for name in &config_names {
            let config_path = current.join(name);
            if config_path.exists() {
                return Some(config_path);
            }
        }

        // Move to parent directory
        if let Some(parent) = current.parent() {
            current = parent.to_path_buf();
        } else {
            break;
        }
    }

    None
}

/// Load and compile configuration
pub fn load_compiled_config(path: &Path) -> Result<CompiledConfig, ConfigError> {
    let config = load_config(path)?;
    CompiledConfig::from_config(config)
}

/// Read and compile a configuration file named explicitly by the user
pub fn load_compiled_config_file(path: &Path) -> Result<CompiledConfig, ConfigError> {
    let config = read_config_file(path)?;
    CompiledConfig::from_config(config)
}
