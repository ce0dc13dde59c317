//! csv-eda CLI - Exploratory Data Analysis
//!
//! Profiles a CSV file and prints a report, or serves the browser dashboard.
//!
//! Usage:
//!   csv-eda [OPTIONS] [FILE]
//!   csv-eda --web [FILE]

use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use csv_eda::{
    CompiledConfig, CorrelationMethod, Dataset, MAX_BINS, ReportOptions, generate_json,
    generate_report, generate_summary, load_compiled_config, load_compiled_config_file,
    parse_delimiter,
    web::{ServerConfig, start_server},
};

/// csv-eda - A first look at a tabular dataset
#[derive(Parser, Debug)]
#[command(name = "csv-eda")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file to analyse (optional with --web)
    file: Option<PathBuf>,

    /// Field separator (',' or ';')
    #[arg(long, value_name = "CHAR", value_parser = parse_sep)]
    sep: Option<u8>,

    /// Number of rows to show in the preview
    #[arg(long, value_name = "N")]
    rows: Option<usize>,

    /// Column for value counts, statistics and histogram
    #[arg(long)]
    column: Option<String>,

    /// Correlation method (pearson or spearman)
    #[arg(long)]
    method: Option<CorrelationMethod>,

    /// Histogram bin count (default: automatic)
    #[arg(long, value_parser = parse_bins)]
    bins: Option<usize>,

    /// Output file for the report (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show summary only (shape, dtypes, missing values)
    #[arg(short, long)]
    summary: bool,

    /// Machine-readable JSON output
    #[arg(long)]
    json: bool,

    /// Config file path (default: search for .eda.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Show timing information
    #[arg(long)]
    timing: bool,

    /// Number of threads for parallel processing (default: all CPU cores)
    #[arg(long, short = 'j', value_name = "N")]
    jobs: Option<usize>,

    // === Web dashboard options ===
    /// Start web server for the interactive dashboard
    #[arg(long)]
    web: bool,

    /// Port for web server (default: 3000)
    #[arg(long, default_value = "3000")]
    port: u16,

    /// Don't open browser automatically when starting web server
    #[arg(long)]
    no_open: bool,

    /// API endpoint URL for frontend (useful for separate deployments)
    #[arg(long)]
    api_endpoint: Option<String>,
}

fn parse_sep(s: &str) -> Result<u8, String> {
    parse_delimiter(s).ok_or_else(|| {
        format!("invalid separator '{}': expected a single ASCII character other than a quote or newline", s)
    })
}

fn parse_bins(s: &str) -> Result<usize, String> {
    let bins: usize = s.parse().map_err(|e| format!("{}", e))?;
    if bins == 0 || bins > MAX_BINS {
        return Err(format!("bin count must be between 1 and {}", MAX_BINS));
    }
    Ok(bins)
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Configure thread pool
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .unwrap_or_else(|e| warn!(error = %e, "could not set thread count"));
        debug!(threads = jobs, "configured thread pool");
    }

    let total_start = Instant::now();

    // Load configuration file
    let mut config = match &args.config {
        Some(path) => {
            if !path.is_file() {
                return Err(format!("Config file not found: {}", path.display()).into());
            }
            load_compiled_config_file(path)?
        }
        None => {
            let search_root = args.file.clone().unwrap_or_else(|| PathBuf::from("."));
            load_compiled_config(&search_root).unwrap_or_else(|e| {
                warn!(error = %e, "no config file loaded");
                CompiledConfig::empty()
            })
        }
    };

    // CLI args override config, which overrides defaults
    if let Some(sep) = args.sep {
        config.csv.delimiter = sep;
    }
    if let Some(rows) = args.rows {
        config.preview_rows = rows;
    }
    if let Some(method) = args.method {
        config.method = method;
    }
    if args.bins.is_some() {
        config.histogram_bins = args.bins;
    }

    let dataset = match &args.file {
        Some(path) => {
            eprintln!("Loading '{}'...", path.display());
            let load_start = Instant::now();
            let mut dataset = Dataset::from_path(path, &config.csv)?;
            let removed = config.apply_exclusions(&mut dataset);
            if removed > 0 {
                info!(removed, "dropped excluded columns");
            }

            let shape = dataset.shape();
            if args.timing {
                eprintln!(
                    "Loaded {} rows x {} columns (took {:.2?})\n",
                    shape.rows,
                    shape.columns,
                    load_start.elapsed()
                );
            } else {
                eprintln!("Loaded {} rows x {} columns\n", shape.rows, shape.columns);
            }
            Some(dataset)
        }
        None => None,
    };

    // Web dashboard mode
    if args.web {
        let server_config = ServerConfig {
            port: args.port,
            open_browser: !args.no_open,
            api_endpoint: args.api_endpoint.clone(),
        };

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(start_server(dataset, config, server_config))
            .map_err(|e| -> Box<dyn std::error::Error> { e })?;

        return Ok(());
    }

    let dataset = dataset.ok_or("No input file given (pass a CSV file, or use --web)")?;

    let options = ReportOptions {
        preview_rows: config.preview_rows,
        column: args.column.clone(),
        method: config.method,
        histogram_bins: config.histogram_bins,
    };

    // Generate output
    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(stdout()),
    };

    if args.json {
        generate_json(&dataset, &options, &mut writer)?;
    } else if args.summary {
        generate_summary(&dataset, &mut writer)?;
    } else {
        generate_report(&dataset, &options, &mut writer)?;
    }
    writer.flush()?;

    if let Some(path) = &args.output {
        eprintln!("Report written to: {}", path.display());
    }

    if args.timing {
        eprintln!("Total time: {:.2?}", total_start.elapsed());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sep_goes_through_delimiter_rules() {
        assert_eq!(parse_sep(";"), Ok(b';'));
        assert_eq!(parse_sep("\\t"), Ok(b'\t'));
        assert!(parse_sep("\"").is_err());
        assert!(parse_sep("\n").is_err());
        assert!(parse_sep("\r").is_err());
        assert!(parse_sep("é").is_err());
    }

    #[test]
    fn test_bins_flag_is_bounded() {
        assert_eq!(parse_bins("20"), Ok(20));
        assert!(parse_bins("0").is_err());
        assert!(parse_bins("1001").is_err());
        assert!(parse_bins("18446744073709551615").is_err());

        let args = Args::try_parse_from(["csv-eda", "data.csv", "--sep", "\""]);
        assert!(args.is_err());
    }
}
