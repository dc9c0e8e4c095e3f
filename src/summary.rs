//! Table summaries for console inspection
//!
//! Shape, column list, head preview, missing counts per column, duplicate row
//! count and an inferred type per column.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::coercion::parse_real;
use crate::types::{RawCell, RawTable};

/// Type inferred from the present cells of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    /// Every cell is missing
    Empty,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Real => "real",
            ColumnType::Text => "text",
            ColumnType::Empty => "empty",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-column statistic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub missing: usize,
    pub column_type: ColumnType,
}

/// Summary of a table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    /// First rows of the table
    pub head: Vec<Vec<RawCell>>,
    /// Rows identical to an earlier row (missing cells compare equal)
    pub duplicate_rows: usize,
}

impl TableSummary {
    pub fn of(table: &RawTable, head_rows: usize) -> Self {
        let columns = table
            .columns()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let cells = table.rows().iter().map(|row| row[i].as_deref());
                ColumnSummary {
                    name: name.clone(),
                    missing: table.rows().iter().filter(|row| row[i].is_none()).count(),
                    column_type: infer_column_type(cells),
                }
            })
            .collect();

        let mut seen: HashSet<&Vec<RawCell>> = HashSet::with_capacity(table.len());
        let duplicate_rows = table.rows().iter().filter(|row| !seen.insert(*row)).count();

        Self {
            rows: table.len(),
            columns,
            head: table.rows().iter().take(head_rows).cloned().collect(),
            duplicate_rows,
        }
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns.len())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.missing).sum()
    }
}

/// Infer the narrowest type holding every present cell
pub fn infer_column_type<'a>(cells: impl Iterator<Item = Option<&'a str>>) -> ColumnType {
    let mut inferred = ColumnType::Empty;

    for cell in cells.flatten() {
        let trimmed = cell.trim();
        let cell_type = if trimmed.parse::<i64>().is_ok() {
            ColumnType::Integer
        } else if parse_real(trimmed).is_some() {
            ColumnType::Real
        } else {
            return ColumnType::Text;
        };

        inferred = match (inferred, cell_type) {
            (ColumnType::Empty, t) => t,
            (ColumnType::Integer, ColumnType::Integer) => ColumnType::Integer,
            _ => ColumnType::Real,
        };
    }

    inferred
}
