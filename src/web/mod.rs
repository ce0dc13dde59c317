//! Web dashboard for csv-eda
//!
//! Serves a browser UI where a CSV file can be uploaded and explored:
//! - Shape, column dtypes and missing values (table or bar chart)
//! - Value counts and univariate statistics for a selected column
//! - Histogram with the column mean
//! - Pearson / Spearman correlation heatmap with labels

pub mod chart;
pub mod routes;
pub mod server;

pub use chart::{HeatmapData, correlation_heatmap};
pub use server::{AppState, ServerConfig, build_router, start_server};
