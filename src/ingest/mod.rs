//! CSV readers for the uploaded input files.

pub mod calendar_inputs;
pub mod class_inputs;
pub mod seating_inputs;

use crate::domain::model::Sheet;
use crate::utils::error::{Result, TimetableError};
use std::collections::BTreeMap;

/// A header-indexed CSV file. Cells are trimmed; rows that are entirely
/// blank are dropped.
#[derive(Debug, Clone)]
pub struct CsvTable {
    file: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn parse(file: &str, data: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(data);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            if cells.iter().all(|c| c.is_empty()) {
                continue;
            }
            rows.push(cells);
        }

        tracing::debug!("Parsed {}: {} columns, {} rows", file, headers.len(), rows.len());

        Ok(Self {
            file: file.to_string(),
            headers,
            rows,
        })
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Case-insensitive column lookup.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column(name).ok_or_else(|| {
            TimetableError::invalid_input(&self.file, 1, format!("missing column '{}'", name))
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = CsvRow<'_>> {
        self.rows.iter().enumerate().map(move |(i, cells)| CsvRow {
            table: self,
            // header is line 1
            line: i + 2,
            cells,
        })
    }

    /// Raw cell grid, used for rosters where each column is one course.
    pub fn column_values(&self, index: usize) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.get(index))
            .filter(|cell| !is_blank(cell))
            .cloned()
            .collect()
    }

    /// The table as a display sheet, cells unchanged.
    pub fn to_sheet(&self, name: &str) -> Sheet {
        let mut sheet = Sheet::new(name, self.headers.clone());
        for row in &self.rows {
            sheet.push_row(row.clone());
        }
        sheet
    }

    /// Rows as JSON-friendly maps keyed by header; missing cells become "".
    pub fn records(&self) -> Vec<BTreeMap<String, String>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .enumerate()
                    .map(|(i, h)| {
                        let value = row.get(i).map(|v| v.as_str()).unwrap_or("");
                        let value = if is_blank(value) { "" } else { value };
                        (h.clone(), value.to_string())
                    })
                    .collect()
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CsvRow<'a> {
    table: &'a CsvTable,
    line: usize,
    cells: &'a [String],
}

impl<'a> CsvRow<'a> {
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn at(&self, index: usize) -> Option<&'a str> {
        self.cells
            .get(index)
            .map(|c| c.as_str())
            .filter(|c| !is_blank(c))
    }

    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.table.column(column).and_then(|i| self.at(i))
    }

    pub fn require(&self, column: &str) -> Result<&'a str> {
        self.get(column).ok_or_else(|| {
            TimetableError::invalid_input(
                &self.table.file,
                self.line,
                format!("'{}' is empty", column),
            )
        })
    }

    /// Reads a whole number; spreadsheet exports often write `3.0`.
    pub fn number(&self, column: &str) -> Result<Option<u32>> {
        match self.get(column) {
            None => Ok(None),
            Some(raw) => parse_count(raw).map(Some).ok_or_else(|| {
                TimetableError::invalid_input(
                    &self.table.file,
                    self.line,
                    format!("'{}' is not a whole number: {}", column, raw),
                )
            }),
        }
    }

    pub fn require_number(&self, column: &str) -> Result<u32> {
        self.number(column)?.ok_or_else(|| {
            TimetableError::invalid_input(
                &self.table.file,
                self.line,
                format!("'{}' is empty", column),
            )
        })
    }
}

/// Pandas-style missing values count as blank.
pub fn is_blank(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.eq_ignore_ascii_case("nan") || v.eq_ignore_ascii_case("none")
}

pub fn parse_count(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u32>() {
        return Some(n);
    }
    let f = raw.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

/// Splits a comma-separated cell into trimmed, non-empty parts.
pub fn split_list(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
