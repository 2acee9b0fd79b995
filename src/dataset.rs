// Dataset - in-memory table built from an uploaded CSV
// Rows keep file order and raw string values; typed access happens after validation.

use crate::validation::SchemaError;
use anyhow::Context;
use indexmap::IndexSet;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// An uploaded table: header names in file order plus string rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Borrowed view of one dataset row with lookup by column name
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [String],
}

impl<'a> Row<'a> {
    /// Value of `column` in this row, `None` if the column does not exist
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
            .map(String::as_str)
    }
}

impl Dataset {
    /// Build a dataset from already-split header and rows.
    ///
    /// Every row must have one value per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, SchemaError> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(SchemaError::MalformedCsv {
                    line: idx as u64 + 2,
                    message: format!(
                        "expected {} fields, found {}",
                        columns.len(),
                        row.len()
                    ),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Parse CSV text with a header line
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, SchemaError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!(
            columns = columns.len(),
            rows = rows.len(),
            "Parsed CSV dataset"
        );
        Ok(Self { columns, rows })
    }

    pub fn from_csv_str(text: &str) -> Result<Self, SchemaError> {
        Self::from_csv_reader(text.as_bytes())
    }

    /// Read a CSV file.
    ///
    /// Open and read failures are I/O errors; CSV problems stay a [`SchemaError`]
    /// inside the returned error.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(Self::from_csv_reader(file)?)
    }

    /// Header names in file order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// All values of `column` in row order, `None` if the column is absent
    pub fn column_values(&self, column: &str) -> Option<impl Iterator<Item = &str>> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(self.rows.iter().map(move |row| row[idx].as_str()))
    }

    /// Number of distinct non-empty values in `column`.
    ///
    /// Empty cells are treated as missing and do not count; an absent column has 0.
    pub fn distinct_count(&self, column: &str) -> usize {
        match self.column_values(column) {
            Some(values) => values
                .filter(|v| !v.trim().is_empty())
                .collect::<IndexSet<_>>()
                .len(),
            None => 0,
        }
    }
}

fn csv_error(err: csv::Error) -> SchemaError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    SchemaError::MalformedCsv {
        line,
        message: err.to_string(),
    }
}
