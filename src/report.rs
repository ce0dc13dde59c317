//! Report generation for dataset exploration
//!
//! Renders the dashboard sections as plain-text tables (or JSON) for use from
//! the terminal.

use std::io::{self, Write};

use serde::Serialize;

use crate::correlation::{
    CorrelationMatrix, CorrelationMethod, CorrelationRecord, correlation_matrix, format_label,
};
use crate::dataset::Dataset;
use crate::profile::{
    Description, Histogram, MissingStat, Overview, ValueCount, describe, find_column, histogram,
    missing_values, overview, value_counts,
};

/// What the full report should include
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Rows shown in the data preview
    pub preview_rows: usize,
    /// Column for the value-count, describe and histogram sections
    pub column: Option<String>,
    pub method: CorrelationMethod,
    pub histogram_bins: Option<usize>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            column: None,
            method: CorrelationMethod::default(),
            histogram_bins: None,
        }
    }
}

/// Write rows as an aligned table
fn write_table<W: Write>(writer: &mut W, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    writeln!(writer, "  {}", line(headers.to_vec()))?;
    writeln!(
        writer,
        "  {}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ")
    )?;
    for row in rows {
        writeln!(writer, "  {}", line(row.iter().map(String::as_str).collect()))?;
    }
    Ok(())
}

fn format_percent(percent: f64) -> String {
    if percent.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.2}%", percent)
    }
}

fn write_overview<W: Write>(dataset: &Dataset, writer: &mut W) -> io::Result<()> {
    let shape = dataset.shape();
    writeln!(writer, "Rows: {} | Columns: {}", shape.rows, shape.columns)?;
    writeln!(writer)?;

    writeln!(writer, "Columns and dtypes:")?;
    let rows: Vec<Vec<String>> = dataset
        .dtypes()
        .into_iter()
        .map(|d| vec![d.column, d.dtype, d.kind.to_string()])
        .collect();
    write_table(writer, &["column", "dtype", "kind"], &rows)?;
    writeln!(writer)?;

    writeln!(writer, "Missing values:")?;
    write_missing(&missing_values(dataset), writer)?;
    writeln!(writer)?;
    Ok(())
}

fn write_missing<W: Write>(missing: &[MissingStat], writer: &mut W) -> io::Result<()> {
    let rows: Vec<Vec<String>> = missing
        .iter()
        .map(|m| vec![m.column.clone(), m.missing.to_string(), format_percent(m.percent)])
        .collect();
    write_table(writer, &["column", "missing", "% NaN values"], &rows)
}

fn write_matrix<W: Write>(matrix: &CorrelationMatrix, writer: &mut W) -> io::Result<()> {
    let variables = matrix.variables();
    let mut headers: Vec<&str> = vec![""];
    headers.extend(variables.iter().map(String::as_str));

    let rows: Vec<Vec<String>> = variables
        .iter()
        .enumerate()
        .map(|(row, name)| {
            std::iter::once(name.clone())
                .chain((0..variables.len()).map(|col| format_label(matrix.get(row, col))))
                .collect()
        })
        .collect();

    write_table(writer, &headers, &rows)
}

fn write_column_sections<W: Write>(
    dataset: &Dataset,
    name: &str,
    bins: Option<usize>,
    writer: &mut W,
) -> io::Result<()> {
    let column = match find_column(dataset, name) {
        Ok(column) => column,
        Err(e) => {
            writeln!(writer, "Column analysis unavailable: {}", e)?;
            writeln!(writer)?;
            return Ok(());
        }
    };

    writeln!(writer, "Value counts ({}):", name)?;
    let rows: Vec<Vec<String>> = value_counts(column)
        .into_iter()
        .map(|v| vec![v.value, v.count.to_string()])
        .collect();
    write_table(writer, &["value", "count"], &rows)?;
    writeln!(writer)?;

    writeln!(writer, "Univariate statistics ({}):", name)?;
    let rows: Vec<Vec<String>> = describe(column)
        .rows()
        .into_iter()
        .map(|(stat, value)| vec![stat.to_string(), value])
        .collect();
    write_table(writer, &["statistic", "value"], &rows)?;
    writeln!(writer)?;

    if let Ok(hist) = histogram(column, bins) {
        writeln!(writer, "Distribution ({}, mean {:.4}):", name, hist.mean)?;
        let peak = hist.bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
        let last = hist.bins.len().saturating_sub(1);
        for (i, bin) in hist.bins.iter().enumerate() {
            let bar = "#".repeat(bin.count * 40 / peak);
            let close = if i == last { ']' } else { ')' };
            writeln!(
                writer,
                "  [{:>12.4}, {:>12.4}{} {:>6} {}",
                bin.start, bin.end, close, bin.count, bar
            )?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

/// Generate a summary report: shape, dtypes and missing values
pub fn generate_summary<W: Write>(dataset: &Dataset, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "Exploratory Data Analysis")?;
    writeln!(writer, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    writeln!(writer)?;
    write_overview(dataset, writer)
}

/// Generate the full report
pub fn generate_report<W: Write>(
    dataset: &Dataset,
    options: &ReportOptions,
    writer: &mut W,
) -> io::Result<()> {
    generate_summary(dataset, writer)?;

    if options.preview_rows > 0 {
        writeln!(writer, "First {} rows:", options.preview_rows)?;
        let names = dataset.column_names();
        write_table(writer, &names, &dataset.head(options.preview_rows))?;
        writeln!(writer)?;
    }

    if let Some(name) = &options.column {
        write_column_sections(dataset, name, options.histogram_bins, writer)?;
    }

    writeln!(writer, "Correlation ({}):", options.method)?;
    match correlation_matrix(dataset, options.method) {
        Ok(matrix) => write_matrix(&matrix, writer)?,
        Err(e) => writeln!(writer, "  unavailable: {}", e)?,
    }

    Ok(())
}

/// Per-column section of the JSON report
#[derive(Debug, Serialize)]
pub struct ColumnReport {
    pub column: String,
    pub value_counts: Vec<ValueCount>,
    pub description: Description,
    pub histogram: Option<Histogram>,
}

/// Machine-readable report
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub overview: Overview,
    pub head: Vec<Vec<String>>,
    pub column: Option<ColumnReport>,
    pub method: CorrelationMethod,
    pub correlation: Option<Vec<CorrelationRecord>>,
    pub correlation_error: Option<String>,
}

pub fn build_json_report(dataset: &Dataset, options: &ReportOptions) -> JsonReport {
    let column = options
        .column
        .as_deref()
        .and_then(|name| find_column(dataset, name).ok())
        .map(|column| ColumnReport {
            column: column.name().to_string(),
            value_counts: value_counts(column),
            description: describe(column),
            histogram: histogram(column, options.histogram_bins).ok(),
        });

    let (correlation, correlation_error) = match correlation_matrix(dataset, options.method) {
        Ok(matrix) => (Some(matrix.to_records()), None),
        Err(e) => (None, Some(e.to_string())),
    };

    JsonReport {
        overview: overview(dataset),
        head: dataset.head(options.preview_rows),
        column,
        method: options.method,
        correlation,
        correlation_error,
    }
}

/// Generate the report as pretty-printed JSON
pub fn generate_json<W: Write>(
    dataset: &Dataset,
    options: &ReportOptions,
    writer: &mut W,
) -> io::Result<()> {
    let report = build_json_report(dataset, options);
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CsvOptions;

    fn sample() -> Dataset {
        let text = "name,age,score,member\nann,31,8.5,true\nbob,,6.0,false\ncid,45,9.0,true\n";
        Dataset::from_reader(text.as_bytes(), &CsvOptions::default()).unwrap()
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_summary_sections() {
        let ds = sample();
        let text = render(|w| generate_summary(&ds, w));

        assert!(text.contains("Rows: 3 | Columns: 4"));
        assert!(text.contains("Columns and dtypes:"));
        assert!(text.contains("Missing values:"));
        assert!(text.contains("33.33%"));
    }

    #[test]
    fn test_full_report_with_column() {
        let ds = sample();
        let options = ReportOptions {
            column: Some("score".to_string()),
            ..ReportOptions::default()
        };
        let text = render(|w| generate_report(&ds, &options, w));

        assert!(text.contains("First 5 rows:"));
        assert!(text.contains("Value counts (score):"));
        assert!(text.contains("Univariate statistics (score):"));
        assert!(text.contains("Distribution (score"));
        assert!(text.contains("Correlation (pearson):"));
        assert!(text.contains("1.00"));
    }

    #[test]
    fn test_histogram_last_bin_is_closed() {
        let ds = sample();
        let options = ReportOptions {
            column: Some("score".to_string()),
            histogram_bins: Some(3),
            ..ReportOptions::default()
        };
        let text = render(|w| generate_report(&ds, &options, w));

        let bins: Vec<&str> = text
            .lines()
            .skip_while(|l| !l.starts_with("Distribution (score"))
            .skip(1)
            .take(3)
            .collect();
        assert!(bins[0].contains("7.0000)"));
        assert!(bins[1].contains("8.0000)"));
        assert!(bins[2].contains("9.0000]"));
    }

    #[test]
    fn test_report_with_unknown_column() {
        let ds = sample();
        let options = ReportOptions {
            column: Some("missing".to_string()),
            ..ReportOptions::default()
        };
        let text = render(|w| generate_report(&ds, &options, w));
        assert!(text.contains("Unknown column: missing"));
    }

    #[test]
    fn test_report_without_enough_numeric_columns() {
        let ds = Dataset::from_reader("a,b\n1,x\n2,y\n".as_bytes(), &CsvOptions::default()).unwrap();
        let text = render(|w| generate_report(&ds, &ReportOptions::default(), w));
        assert!(text.contains("unavailable: Correlation needs at least 2 numeric columns, found 1"));
    }

    #[test]
    fn test_json_report() {
        let ds = sample();
        let options = ReportOptions {
            column: Some("name".to_string()),
            method: CorrelationMethod::Spearman,
            ..ReportOptions::default()
        };
        let text = render(|w| generate_json(&ds, &options, w));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["overview"]["shape"]["rows"], 3);
        assert_eq!(value["method"], "spearman");
        assert_eq!(value["correlation"].as_array().unwrap().len(), 4);
        assert_eq!(value["column"]["description"]["kind"], "categorical");
        assert!(value["column"]["histogram"].is_null());
    }
}
