//! # csv-eda - Exploratory Data Analysis for CSV files
//!
//! A small tool for the first look at a tabular dataset: its shape, column
//! types, missing values, value distributions and pairwise correlation,
//! rendered as a terminal report or in a browser dashboard.
//!
//! ## Usage
//!
//! ```bash
//! # Full report for a file
//! csv-eda data.csv
//!
//! # Semicolon separated input, Spearman correlation, details for one column
//! csv-eda --sep ';' --method spearman --column age data.csv
//!
//! # Interactive dashboard (upload a file from the browser)
//! csv-eda --web
//! ```
//!
//! ## Correlation table
//!
//! [`summarize_correlation`] produces one record per ordered pair of numeric
//! columns, row-major in column order, with a two-decimal label:
//!
//! ```text
//! variable_a  variable_b  coefficient  label
//! a           a           1.0          1.00
//! a           b           0.5          0.50
//! ...
//! ```

pub mod config;
pub mod correlation;
pub mod dataset;
pub mod profile;
pub mod report;
pub mod web;

pub use config::{
    AnalysisConfig, ChartConfig, CompiledConfig, ConfigError, CorrelationConfig, CsvConfig,
    EdaConfig, load_compiled_config, load_compiled_config_file, load_config, read_config_file,
};
pub use correlation::{
    CorrelationError, CorrelationMatrix, CorrelationMethod, CorrelationRecord, correlation_matrix,
    format_label, summarize_correlation,
};
pub use dataset::{
    Column, ColumnData, ColumnKind, CsvOptions, Dataset, DatasetError, DtypeEntry, Shape, classify,
    classify_column, parse_delimiter,
};
pub use profile::{
    CategoricalSummary, Description, Histogram, HistogramBin, MAX_BINS, MissingStat, NumericSummary,
    Overview, ProfileError, ValueCount, describe, histogram, missing_values, overview,
    value_counts,
};
pub use report::{
    JsonReport, ReportOptions, build_json_report, generate_json, generate_report,
    generate_summary,
};
