//! CSV loading and column classification
//!
//! Reads delimited text with the `csv` crate and classifies every column into a
//! [`ColumnKind`] before any analysis touches it. Classification of independent
//! columns runs in parallel via Rayon.

use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Cell contents (after trimming) that are read as missing values
pub const DEFAULT_MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A",
    "#N/A N/A", "#NA", "<NA>", "1.#QNAN", "-1.#QNAN", "1.#IND", "-1.#IND",
];

/// Errors that can occur while loading a dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("No columns to parse from input")]
    Empty,

    #[error("Line {line}: expected {expected} fields, found {found}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Column '{name}' has {found} values, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
}

/// Options controlling how CSV text is read
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (`,` or `;` in practice)
    pub delimiter: u8,
    /// Tokens that mark a missing cell
    pub missing_tokens: HashSet<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            missing_tokens: DEFAULT_MISSING_TOKENS
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl CsvOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Add extra missing-value tokens on top of the defaults
    pub fn with_missing_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_tokens
            .extend(tokens.into_iter().map(|t| t.into().trim().to_string()));
        self
    }

    pub fn is_missing(&self, cell: &str) -> bool {
        self.missing_tokens.contains(cell)
    }
}

/// Parse a user-supplied delimiter: exactly one ASCII character
pub fn parse_delimiter(s: &str) -> Option<u8> {
    match s.as_bytes() {
        [b] if b.is_ascii() && *b != b'"' && *b != b'\n' && *b != b'\r' => Some(*b),
        _ if s == "\\t" => Some(b'\t'),
        _ => None,
    }
}

/// Classified kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Every observed cell is a number
    Numeric,
    /// At least one observed cell is free text
    Categorical,
    /// Every observed cell is `true` or `false`
    Boolean,
    /// No observed cells at all
    Other,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Typed storage for one column; `None` is a missing cell
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric {
        values: Vec<Option<f64>>,
        /// No missing cells and every value is a whole number
        integral: bool,
    },
    Boolean(Vec<Option<bool>>),
    Categorical(Vec<Option<String>>),
    /// Entirely missing column of the given length
    Other(usize),
}

/// A named, classified column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let integral = values
            .iter()
            .all(|v| v.is_some_and(|x| x.is_finite() && x.fract() == 0.0));
        Self::new(name, ColumnData::Numeric { values, integral })
    }

    pub fn boolean(name: impl Into<String>, values: Vec<Option<bool>>) -> Self {
        Self::new(name, ColumnData::Boolean(values))
    }

    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::Categorical(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn kind(&self) -> ColumnKind {
        match self.data {
            ColumnData::Numeric { .. } => ColumnKind::Numeric,
            ColumnData::Boolean(_) => ColumnKind::Boolean,
            ColumnData::Categorical(_) => ColumnKind::Categorical,
            ColumnData::Other(_) => ColumnKind::Other,
        }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Numeric { values, .. } => values.len(),
            ColumnData::Boolean(values) => values.len(),
            ColumnData::Categorical(values) => values.len(),
            ColumnData::Other(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn missing_count(&self) -> usize {
        match &self.data {
            ColumnData::Numeric { values, .. } => values.iter().filter(|v| v.is_none()).count(),
            ColumnData::Boolean(values) => values.iter().filter(|v| v.is_none()).count(),
            ColumnData::Categorical(values) => values.iter().filter(|v| v.is_none()).count(),
            ColumnData::Other(len) => *len,
        }
    }

    /// Storage type name as shown in the dtype listing
    pub fn dtype(&self) -> &'static str {
        match &self.data {
            ColumnData::Numeric { integral: true, .. } => "int64",
            ColumnData::Numeric { .. } => "float64",
            ColumnData::Boolean(values) if values.iter().all(Option::is_some) => "bool",
            ColumnData::Boolean(_) | ColumnData::Categorical(_) => "object",
            ColumnData::Other(_) => "empty",
        }
    }

    /// Numeric cells, if this is a numeric column
    pub fn numeric_values(&self) -> Option<&[Option<f64>]> {
        match &self.data {
            ColumnData::Numeric { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Display string for one cell, `None` when missing
    pub fn display_value(&self, row: usize) -> Option<String> {
        match &self.data {
            ColumnData::Numeric { values, integral } => {
                values.get(row).copied().flatten().map(|v| format_number(v, *integral))
            }
            ColumnData::Boolean(values) => values
                .get(row)
                .copied()
                .flatten()
                .map(|b| if b { "True" } else { "False" }.to_string()),
            ColumnData::Categorical(values) => values.get(row).cloned().flatten(),
            ColumnData::Other(_) => None,
        }
    }

    /// Display strings of all observed cells, in row order
    pub fn observed_display_values(&self) -> Vec<String> {
        (0..self.len()).filter_map(|row| self.display_value(row)).collect()
    }
}

fn format_number(value: f64, integral: bool) -> String {
    if integral || !value.is_finite() || value.fract() != 0.0 {
        format!("{}", value)
    } else {
        format!("{:.1}", value)
    }
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Decide the kind of a column from its raw cells
pub fn classify(cells: &[Option<String>]) -> ColumnKind {
    let mut observed = cells.iter().flatten().peekable();
    if observed.peek().is_none() {
        return ColumnKind::Other;
    }

    if observed.clone().all(|c| parse_bool(c).is_some()) {
        ColumnKind::Boolean
    } else if observed.all(|c| c.parse::<f64>().is_ok()) {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

/// Classify raw cells and convert them into typed column storage
pub fn classify_column(name: String, cells: Vec<Option<String>>) -> Column {
    let data = match classify(&cells) {
        ColumnKind::Other => ColumnData::Other(cells.len()),
        ColumnKind::Boolean => {
            ColumnData::Boolean(cells.iter().map(|c| c.as_deref().and_then(parse_bool)).collect())
        }
        ColumnKind::Numeric => {
            let integral = cells
                .iter()
                .all(|c| c.as_deref().is_some_and(|s| s.parse::<i64>().is_ok()));
            let values = cells
                .iter()
                .map(|c| c.as_deref().and_then(|s| s.parse::<f64>().ok()))
                .collect();
            ColumnData::Numeric { values, integral }
        }
        ColumnKind::Categorical => ColumnData::Categorical(cells),
    };

    Column { name, data }
}

/// Give empty header cells a placeholder name and de-duplicate repeated names
fn normalize_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::new();

    for (idx, name) in raw.enumerate() {
        let base = match name.trim() {
            "" => format!("Unnamed: {}", idx),
            trimmed => trimmed.to_string(),
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }

        seen.insert(candidate.clone());
        names.push(candidate);
    }

    names
}

/// Shape of a dataset: (rows, columns)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Shape {
    pub rows: usize,
    pub columns: usize,
}

/// One entry of the dtype listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DtypeEntry {
    pub column: String,
    pub dtype: String,
    pub kind: ColumnKind,
}

/// A rectangular table of classified columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Build a dataset from already classified columns
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let rows = columns.first().map(Column::len).unwrap_or(0);
        let mut names = HashSet::new();

        for column in &columns {
            if column.len() != rows {
                return Err(DatasetError::LengthMismatch {
                    name: column.name.clone(),
                    expected: rows,
                    found: column.len(),
                });
            }
            if !names.insert(column.name.as_str()) {
                return Err(DatasetError::DuplicateColumn(column.name.clone()));
            }
        }

        Ok(Self { columns, rows })
    }

    /// Read CSV text; the first record is the header
    pub fn from_reader<R: Read>(reader: R, options: &CsvOptions) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = csv_reader.records();
        let header = match records.next() {
            Some(record) => record?,
            None => return Err(DatasetError::Empty),
        };

        let names = normalize_headers(header.iter());
        let width = names.len();
        if width == 0 {
            return Err(DatasetError::Empty);
        }

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
        let mut rows = 0;

        for result in records {
            let record = result?;
            if record.len() > width {
                return Err(DatasetError::RaggedRow {
                    line: record.position().map(|p| p.line()).unwrap_or(0),
                    expected: width,
                    found: record.len(),
                });
            }

            // Short rows are padded with missing cells
            for (idx, column) in cells.iter_mut().enumerate() {
                let cell = record
                    .get(idx)
                    .map(str::trim)
                    .filter(|c| !options.is_missing(c))
                    .map(str::to_string);
                column.push(cell);
            }
            rows += 1;
        }

        let columns: Vec<Column> = names
            .into_par_iter()
            .zip(cells.into_par_iter())
            .map(|(name, cells)| classify_column(name, cells))
            .collect();

        debug!(rows, columns = columns.len(), "parsed CSV input");

        Ok(Self { columns, rows })
    }

    pub fn from_path(path: &Path, options: &CsvOptions) -> Result<Self, DatasetError> {
        let file = File::open(path)?;
        Self::from_reader(file, options)
    }

    pub fn shape(&self) -> Shape {
        Shape {
            rows: self.rows,
            columns: self.columns.len(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Numeric columns in dataset order
    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| c.kind() == ColumnKind::Numeric)
            .collect()
    }

    pub fn dtypes(&self) -> Vec<DtypeEntry> {
        self.columns
            .iter()
            .map(|c| DtypeEntry {
                column: c.name.clone(),
                dtype: c.dtype().to_string(),
                kind: c.kind(),
            })
            .collect()
    }

    /// First `n` rows as display strings; missing cells are empty
    pub fn head(&self, n: usize) -> Vec<Vec<String>> {
        (0..n.min(self.rows))
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| c.display_value(row).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    /// Keep only the columns matching `keep`; returns the number removed
    pub fn retain_columns<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Column) -> bool,
    {
        let before = self.columns.len();
        self.columns.retain(|c| keep(c));
        before - self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> Dataset {
        Dataset::from_reader(text.as_bytes(), &CsvOptions::default()).unwrap()
    }

    #[test]
    fn test_classify_kinds() {
        let cells = |vals: &[Option<&str>]| -> Vec<Option<String>> {
            vals.iter().map(|v| v.map(str::to_string)).collect()
        };

        assert_eq!(
            classify(&cells(&[Some("1"), Some("2.5"), None])),
            ColumnKind::Numeric
        );
        assert_eq!(
            classify(&cells(&[Some("true"), Some("FALSE")])),
            ColumnKind::Boolean
        );
        assert_eq!(
            classify(&cells(&[Some("1"), Some("two")])),
            ColumnKind::Categorical
        );
        assert_eq!(classify(&cells(&[None, None])), ColumnKind::Other);
    }

    #[test]
    fn test_load_csv_with_missing_values() {
        let ds = load("a,b,c,d\n1,x,true,\n2,NA,false,\n3.5,y,,\n");

        assert_eq!(ds.shape(), Shape { rows: 3, columns: 4 });

        let kinds: Vec<ColumnKind> = ds.columns().iter().map(Column::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Numeric,
                ColumnKind::Categorical,
                ColumnKind::Boolean,
                ColumnKind::Other
            ]
        );

        assert_eq!(ds.column("b").unwrap().missing_count(), 1);
        assert_eq!(ds.column("d").unwrap().missing_count(), 3);
        assert_eq!(ds.column("a").unwrap().dtype(), "float64");
        assert_eq!(ds.column("c").unwrap().dtype(), "object");
    }

    #[test]
    fn test_integral_dtype() {
        let ds = load("n,m\n1,1\n2,\n3,3\n");
        assert_eq!(ds.column("n").unwrap().dtype(), "int64");
        // A missing cell forces the float representation
        assert_eq!(ds.column("m").unwrap().dtype(), "float64");
    }

    #[test]
    fn test_semicolon_delimiter() {
        let options = CsvOptions::default().with_delimiter(b';');
        let ds = Dataset::from_reader("x;y\n1;2\n3;4\n".as_bytes(), &options).unwrap();

        assert_eq!(ds.column_names(), vec!["x", "y"]);
        assert_eq!(ds.numeric_columns().len(), 2);
    }

    #[test]
    fn test_header_normalization() {
        let ds = load("a,,a,a\n1,2,3,4\n");
        assert_eq!(ds.column_names(), vec!["a", "Unnamed: 1", "a.1", "a.2"]);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let ds = load("a,b\n1,2\n3\n");
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.column("b").unwrap().missing_count(), 1);
    }

    #[test]
    fn test_long_row_is_rejected() {
        let result = Dataset::from_reader("a,b\n1,2\n3,4,5\n".as_bytes(), &CsvOptions::default());
        assert!(matches!(
            result,
            Err(DatasetError::RaggedRow {
                expected: 2,
                found: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_input() {
        let result = Dataset::from_reader("".as_bytes(), &CsvOptions::default());
        assert!(matches!(result, Err(DatasetError::Empty)));
    }

    #[test]
    fn test_extra_missing_tokens() {
        let options = CsvOptions::default().with_missing_tokens(["?"]);
        let ds = Dataset::from_reader("a\n1\n?\n".as_bytes(), &options).unwrap();

        let column = ds.column("a").unwrap();
        assert_eq!(column.kind(), ColumnKind::Numeric);
        assert_eq!(column.missing_count(), 1);
    }

    #[test]
    fn test_nan_spellings_are_missing() {
        let ds = load("x\n1\n-nan\n#NA\n<NA>\n1.#IND\n-1.#QNAN\n#N/A N/A\n2\n");

        let column = ds.column("x").unwrap();
        assert_eq!(column.kind(), ColumnKind::Numeric);
        assert_eq!(column.missing_count(), 6);
    }

    #[test]
    fn test_head() {
        let ds = load("a,b\n1,x\n2.5,\n3,z\n");
        let head = ds.head(2);

        assert_eq!(head, vec![vec!["1.0", "x"], vec!["2.5", ""]]);
        assert_eq!(ds.head(10).len(), 3);
    }

    #[test]
    fn test_from_columns_validation() {
        let result = Dataset::from_columns(vec![
            Column::numeric("a", vec![Some(1.0), Some(2.0)]),
            Column::numeric("b", vec![Some(1.0)]),
        ]);
        assert!(matches!(result, Err(DatasetError::LengthMismatch { .. })));

        let result = Dataset::from_columns(vec![
            Column::numeric("a", vec![Some(1.0)]),
            Column::boolean("a", vec![Some(true)]),
        ]);
        assert!(matches!(result, Err(DatasetError::DuplicateColumn(_))));
    }

    #[test]
    fn test_retain_columns() {
        let mut ds = load("id,a,b\n1,2,3\n");
        let removed = ds.retain_columns(|c| c.name() != "id");

        assert_eq!(removed, 1);
        assert_eq!(ds.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(";"), Some(b';'));
        assert_eq!(parse_delimiter("\\t"), Some(b'\t'));
        assert_eq!(parse_delimiter(",,"), None);
        assert_eq!(parse_delimiter("é"), None);
    }
}
