//! Worksheet snapshot: a header row plus data rows.

use serde::{Deserialize, Serialize};

use crate::error::{TaskError, TaskResult};

/// A worksheet read in full. Header cells are trimmed; rows are padded to
/// the header width.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Sheet tab name.
    pub name: String,

    /// Header row (row 1).
    pub headers: Vec<String>,

    /// Data rows (row 2 onward).
    pub rows: Vec<Vec<String>>,
}

/// One data row with its position on the sheet.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    /// 1-based sheet row; the header is row 1 so the first record is row 2.
    pub row_number: usize,

    /// 0-based position among the data rows.
    pub index: usize,

    headers: &'a [String],
    cells: &'a [String],
}

impl Table {
    /// Build a table from raw sheet values. The first row is the header.
    #[must_use]
    pub fn from_values(name: impl Into<String>, values: Vec<Vec<String>>) -> Self {
        let mut iter = values.into_iter();
        let headers: Vec<String> =
            iter.next().unwrap_or_default().into_iter().map(|h| h.trim().to_string()).collect();
        let width = headers.len();

        let rows = iter
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();

        Self { name: name.into(), headers, rows }
    }

    /// Build an empty table with the given header.
    #[must_use]
    pub fn with_headers(name: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            name: name.into(),
            headers: headers.iter().map(|h| (*h).to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// 0-based index of a header.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// 0-based index of a header, or a `MissingColumn` error.
    pub fn require_column(&self, name: &str) -> TaskResult<usize> {
        self.column(name).ok_or_else(|| TaskError::missing_column(&self.name, name))
    }

    /// Append a header and pad every row; returns the new column index.
    pub fn add_column(&mut self, name: &str) -> usize {
        self.headers.push(name.to_string());
        let width = self.headers.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
        width - 1
    }

    /// Overwrite one cell of the snapshot. Out-of-range positions are ignored.
    pub fn set(&mut self, index: usize, col: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(index).and_then(|row| row.get_mut(col)) {
            *cell = value.into();
        }
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate data rows as records.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().enumerate().map(|(index, cells)| Record {
            row_number: index + 2,
            index,
            headers: &self.headers,
            cells,
        })
    }

    /// Sub-table of rows whose `column` equals `value` after trimming.
    /// A missing column yields an empty sub-table.
    #[must_use]
    pub fn filter_by(&self, column: &str, value: &str) -> Self {
        let rows = match self.column(column) {
            Some(col) => self
                .rows
                .iter()
                .filter(|row| row.get(col).is_some_and(|cell| cell.trim() == value))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        Self { name: self.name.clone(), headers: self.headers.clone(), rows }
    }

    /// Header plus rows, ready to write back to a sheet.
    #[must_use]
    pub fn to_values(&self) -> Vec<Vec<String>> {
        let mut values = Vec::with_capacity(self.rows.len() + 1);
        values.push(self.headers.clone());
        values.extend(self.rows.iter().cloned());
        values
    }
}

impl<'a> Record<'a> {
    /// Trimmed cell value under `column`, empty if the column is absent.
    #[must_use]
    pub fn get(&self, column: &str) -> &'a str {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|i| self.cells.get(i))
            .map(|c| c.trim())
            .unwrap_or("")
    }

    /// First non-empty value among several candidate columns.
    #[must_use]
    pub fn get_any(&self, columns: &[&str]) -> &'a str {
        columns.iter().map(|c| self.get(c)).find(|v| !v.is_empty()).unwrap_or("")
    }
}
