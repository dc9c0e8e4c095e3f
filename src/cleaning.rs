//! Row-level cleaning
//!
//! The first two pipeline stages:
//! - Missing-value elimination (all-or-nothing per row, no imputation)
//! - Exact-duplicate elimination over the full row tuple

use std::collections::HashSet;

use crate::types::{CompleteRow, RawTable};

/// Drops every row containing a missing cell
pub struct MissingValueFilter;

impl MissingValueFilter {
    /// Keep rows where every cell is present, in input order
    pub fn apply(table: &RawTable) -> Vec<CompleteRow> {
        table
            .rows()
            .iter()
            .filter_map(|row| {
                row.iter()
                    .cloned()
                    .collect::<Option<Vec<String>>>()
                    .map(|cells| CompleteRow { cells })
            })
            .collect()
    }
}

/// Collapses rows that are identical across all fields
pub struct Deduplicator;

impl Deduplicator {
    /// Keep the first occurrence of each distinct row, in input order
    pub fn apply(rows: Vec<CompleteRow>) -> Vec<CompleteRow> {
        let mut seen: HashSet<CompleteRow> = HashSet::with_capacity(rows.len());
        rows.into_iter()
            .filter(|row| seen.insert(row.clone()))
            .collect()
    }

    /// Number of rows that repeat an earlier row
    pub fn count_duplicates(rows: &[CompleteRow]) -> usize {
        let mut seen: HashSet<&CompleteRow> = HashSet::with_capacity(rows.len());
        rows.iter().filter(|row| !seen.insert(*row)).count()
    }
}
