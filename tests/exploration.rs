//! End-to-end checks: CSV file on disk through to correlation records and reports

use std::fs;
use std::path::Path;

use csv_eda::{
    ColumnKind, CorrelationError, CorrelationMethod, CsvOptions, Dataset, ReportOptions,
    generate_report, load_compiled_config, summarize_correlation,
};

const WEATHER: &str = "\
day;temp;humidity;wind;rain;station
mon;21.5;40;12;false;north
tue;23.0;38;;false;north
wed;19.0;55;20;true;south
thu;;60;22;true;south
fri;25.5;35;8;false;north
sat;24.0;NA;10;false;
sun;18.5;70;25;true;south
";

fn write_csv(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn weather(dir: &Path) -> Dataset {
    let path = write_csv(dir, "weather.csv", WEATHER);
    let options = CsvOptions::default().with_delimiter(b';');
    Dataset::from_path(&path, &options).unwrap()
}

#[test]
fn test_classification_of_real_file() {
    let dir = tempfile::tempdir().unwrap();
    let ds = weather(dir.path());

    let kinds: Vec<(&str, ColumnKind)> = ds.columns().iter().map(|c| (c.name(), c.kind())).collect();
    assert_eq!(
        kinds,
        vec![
            ("day", ColumnKind::Categorical),
            ("temp", ColumnKind::Numeric),
            ("humidity", ColumnKind::Numeric),
            ("wind", ColumnKind::Numeric),
            ("rain", ColumnKind::Boolean),
            ("station", ColumnKind::Categorical),
        ]
    );
}

#[test]
fn test_record_count_symmetry_and_range() {
    let dir = tempfile::tempdir().unwrap();
    let ds = weather(dir.path());

    for method in [CorrelationMethod::Pearson, CorrelationMethod::Spearman] {
        let records = summarize_correlation(&ds, method).unwrap();
        let n = ds.numeric_columns().len();
        assert_eq!(records.len(), n * n);

        for r in &records {
            let mirror = records
                .iter()
                .find(|m| m.variable_a == r.variable_b && m.variable_b == r.variable_a)
                .unwrap();
            assert!((r.coefficient - mirror.coefficient).abs() < 1e-9);
            assert!((-1.0..=1.0).contains(&r.coefficient));

            let decimals = r.label.rsplit('.').next().unwrap();
            assert_eq!(decimals.len(), 2, "label {}", r.label);

            if r.variable_a == r.variable_b {
                assert_eq!(r.coefficient, 1.0);
            }
        }
    }
}

#[test]
fn test_temperature_and_humidity_move_apart() {
    let dir = tempfile::tempdir().unwrap();
    let ds = weather(dir.path());

    let records = summarize_correlation(&ds, CorrelationMethod::Spearman).unwrap();
    let temp_humidity = records
        .iter()
        .find(|r| r.variable_a == "temp" && r.variable_b == "humidity")
        .unwrap();
    assert!(temp_humidity.coefficient < -0.9);
}

#[test]
fn test_three_column_example() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "abc.csv", "a,b,c\n1,2,5\n2,4,3\n3,6,1\n");
    let ds = Dataset::from_path(&path, &CsvOptions::default()).unwrap();

    let records = summarize_correlation(&ds, CorrelationMethod::Pearson).unwrap();
    assert_eq!(records.len(), 9);
    assert_eq!(records[1].variable_a, "a");
    assert_eq!(records[1].variable_b, "b");
    assert!((records[1].coefficient - 1.0).abs() < 1e-12);
    assert_eq!(records[2].variable_b, "c");
    assert!((records[2].coefficient + 1.0).abs() < 1e-12);
}

#[test]
fn test_non_finite_cells_do_not_leak_into_coefficients() {
    let dir = tempfile::tempdir().unwrap();
    for bad in ["-nan", "inf", "-Infinity", "NAN"] {
        let text = format!("x,y\n1,2\n2,1\n3,4\n4,3\n{},100\n", bad);
        let path = write_csv(dir.path(), "odd.csv", &text);
        let ds = Dataset::from_path(&path, &CsvOptions::default()).unwrap();
        assert_eq!(ds.column("x").unwrap().kind(), ColumnKind::Numeric);

        let records = summarize_correlation(&ds, CorrelationMethod::Spearman).unwrap();
        assert_eq!(records[0].coefficient, 1.0, "diagonal with {}", bad);
        assert!((records[1].coefficient - 0.6).abs() < 1e-12, "x,y with {}", bad);
        assert_eq!(records[1].label, "0.60");
    }
}

#[test]
fn test_single_numeric_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "one.csv", "name,value\nx,1\ny,2\n");
    let ds = Dataset::from_path(&path, &CsvOptions::default()).unwrap();

    assert_eq!(
        summarize_correlation(&ds, CorrelationMethod::Pearson),
        Err(CorrelationError::InsufficientData { found: 1 })
    );
}

#[test]
fn test_config_drives_loading() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".eda.toml"),
        "[csv]\nseparator = \";\"\n\n[analysis]\nexclude_columns = [\"wind\"]\n\n[correlation]\nmethod = \"spearman\"\n",
    )
    .unwrap();
    let path = write_csv(dir.path(), "weather.csv", WEATHER);

    let config = load_compiled_config(&path).unwrap();
    let mut ds = Dataset::from_path(&path, &config.csv).unwrap();
    config.apply_exclusions(&mut ds);

    assert_eq!(config.method, CorrelationMethod::Spearman);
    assert!(ds.column("wind").is_none());
    assert_eq!(ds.numeric_columns().len(), 2);
}

#[test]
fn test_report_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let ds = weather(dir.path());

    let options = ReportOptions {
        column: Some("station".to_string()),
        method: CorrelationMethod::Spearman,
        ..ReportOptions::default()
    };
    let mut out = Vec::new();
    generate_report(&ds, &options, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("Rows: 7 | Columns: 6"));
    assert!(text.contains("Value counts (station):"));
    assert!(text.contains("Correlation (spearman):"));
}
