//! Raw tabular input shared by every source.
//!
//! A [`RawTable`] is what the pipeline sees regardless of where the data came
//! from: an uploaded workbook, a CSV export, or a block of tab-separated text
//! pasted from a spreadsheet. Headers are kept as supplied except that empty
//! labels are named `Unnamed: <index>` and repeated labels get numeric
//! suffixes (`40001`, `40001.1`, ...), the same convention spreadsheet readers
//! use so that the manual-grid aggregator can recover the original label.

use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
};

use calamine::{Data, Reader, open_workbook_auto};
use encoding_rs::{Encoding, UTF_8};
use log::debug;
use serde::Serialize;

use crate::{
    error::{ReconError, TableKind},
    io_utils,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Builds a text cell, mapping whitespace-only input to [`Cell::Empty`].
    pub fn text(value: &str) -> Cell {
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
        }
    }

    fn from_workbook(value: &Data) -> Cell {
        match value {
            Data::Empty => Cell::Empty,
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::text(s),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s),
            Data::Error(e) => Cell::Text(format!("{e:?}")),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_display())
    }
}

/// Renders integral values without a fractional part so spreadsheet-typed
/// identifiers (`40001.0`) read the same as their text form.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// How an input path should be interpreted.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub encoding: Option<&'static Encoding>,
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    kind: TableKind,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Assembles a table from already-split cells. Rows are padded or cut to
    /// the header width and headers are disambiguated.
    pub fn new(kind: TableKind, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let headers = disambiguate_headers(headers);
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self {
            kind,
            headers,
            rows,
        }
    }

    /// Convenience constructor for text-only tables.
    pub fn from_strings(kind: TableKind, headers: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            kind,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|value| Cell::text(value)).collect())
                .collect(),
        )
    }

    /// Parses header-first delimited text such as a pasted spreadsheet selection.
    pub fn from_delimited(kind: TableKind, text: &str, delimiter: u8) -> Result<Self, ReconError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        if text.trim().is_empty() {
            return Err(ReconError::parse(kind, "input is empty"));
        }
        let mut reader = io_utils::open_csv_reader(text.as_bytes(), delimiter);
        let headers = reader
            .headers()
            .map_err(|err| ReconError::parse(kind, format!("reading header row: {err}")))?
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record
                .map_err(|err| ReconError::parse(kind, format!("reading row {}: {err}", idx + 2)))?;
            if record.len() > headers.len() {
                return Err(ReconError::parse(
                    kind,
                    format!(
                        "row {} has {} field(s) but the header row has {}",
                        idx + 2,
                        record.len(),
                        headers.len()
                    ),
                ));
            }
            rows.push(record.iter().map(Cell::text).collect());
        }
        debug!("Parsed {} delimited row(s) for {kind} table", rows.len());
        Ok(Self::new(kind, headers, rows))
    }

    /// Reads the named sheet (or the first sheet) of a spreadsheet workbook.
    pub fn from_workbook(kind: TableKind, path: &Path, sheet: Option<&str>) -> Result<Self, ReconError> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|err| ReconError::parse(kind, format!("opening workbook {path:?}: {err}")))?;
        let sheet_name = match sheet {
            Some(name) => name.to_string(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| ReconError::parse(kind, format!("workbook {path:?} has no sheets")))?,
        };
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|err| ReconError::parse(kind, format!("reading sheet '{sheet_name}': {err}")))?;

        let mut rows = range.rows();
        let headers = rows
            .next()
            .ok_or_else(|| ReconError::parse(kind, format!("sheet '{sheet_name}' is empty")))?
            .iter()
            .map(|cell| Cell::from_workbook(cell).as_display())
            .collect::<Vec<_>>();
        let body = rows
            .map(|row| row.iter().map(Cell::from_workbook).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect::<Vec<_>>();
        debug!(
            "Read {} row(s) from sheet '{}' of {:?} for {kind} table",
            body.len(),
            sheet_name,
            path
        );
        Ok(Self::new(kind, headers, body))
    }

    /// Loads any supported input, dispatching on the path's extension.
    pub fn load(kind: TableKind, path: &Path, options: &LoadOptions) -> Result<Self, ReconError> {
        if io_utils::is_workbook(path) {
            return Self::from_workbook(kind, path, options.sheet.as_deref());
        }
        let bytes = io_utils::read_input_bytes(path).map_err(|source| ReconError::Io {
            table: kind,
            path: PathBuf::from(path),
            source,
        })?;
        let encoding = options.encoding.unwrap_or(UTF_8);
        let text = io_utils::decode_bytes(&bytes, encoding)
            .map_err(|err| ReconError::parse(kind, err.to_string()))?;
        let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
        Self::from_delimited(kind, &text, delimiter)
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&Cell::Empty)
    }
}

/// Names blank headers and suffixes repeats with `.1`, `.2`, ... in column order.
fn disambiguate_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(headers.len());
    let mut result = Vec::with_capacity(headers.len());
    for (idx, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            header
        };
        let mut candidate = base.clone();
        let mut counter = 1usize;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{counter}");
            counter += 1;
        }
        seen.insert(candidate.clone());
        result.push(candidate);
    }
    result
}
