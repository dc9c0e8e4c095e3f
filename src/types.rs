//! Core types for the Synheart Sift pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: the raw table, complete rows, coerced rows, validated records and
//! prepared records carrying the derived screen time category.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SiftError;

/// Column written by the pipeline; never expected in raw input
pub const SCREEN_TIME_CATEGORY_COLUMN: &str = "Screen_Time_Category";

/// Numeric survey fields coerced during type normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    Age,
    DailyScreenTimeHours,
    SleepDurationHours,
    #[serde(rename = "gad_7_score")]
    Gad7Score,
    #[serde(rename = "phq_9_score")]
    Phq9Score,
}

/// Nominal representation of a numeric field in the survey export.
///
/// Coercion reads every field as a real number; the kind only describes the
/// expected input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Integer,
    Real,
}

impl NumericField {
    pub const ALL: [NumericField; 5] = [
        NumericField::Age,
        NumericField::DailyScreenTimeHours,
        NumericField::SleepDurationHours,
        NumericField::Gad7Score,
        NumericField::Phq9Score,
    ];

    /// Header name used by the survey export
    pub fn column_name(&self) -> &'static str {
        match self {
            NumericField::Age => "Age",
            NumericField::DailyScreenTimeHours => "Daily_Screen_Time_Hours",
            NumericField::SleepDurationHours => "Sleep_Duration_Hours",
            NumericField::Gad7Score => "GAD_7_Score",
            NumericField::Phq9Score => "PHQ_9_Score",
        }
    }

    pub fn kind(&self) -> NumericKind {
        match self {
            NumericField::DailyScreenTimeHours | NumericField::SleepDurationHours => {
                NumericKind::Real
            }
            NumericField::Age | NumericField::Gad7Score | NumericField::Phq9Score => {
                NumericKind::Integer
            }
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Header name of the primary platform column
pub const PRIMARY_PLATFORM_COLUMN: &str = "Primary_Platform";

/// Header name of the upstream GAD-7 severity bucket
pub const GAD_7_SEVERITY_COLUMN: &str = "GAD_7_Severity";

/// Positions of the known columns within a table header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub age: usize,
    pub daily_screen_time_hours: usize,
    pub sleep_duration_hours: usize,
    pub gad_7_score: usize,
    pub phq_9_score: usize,
    pub primary_platform: usize,
    pub gad_7_severity: usize,
}

impl ColumnIndex {
    /// Locate every required column in a header.
    ///
    /// Matching is ASCII case-insensitive, so `age` and `Age` both resolve.
    pub fn resolve(columns: &[String]) -> Result<Self, SiftError> {
        Ok(Self {
            age: find_column(columns, NumericField::Age.column_name())?,
            daily_screen_time_hours: find_column(
                columns,
                NumericField::DailyScreenTimeHours.column_name(),
            )?,
            sleep_duration_hours: find_column(
                columns,
                NumericField::SleepDurationHours.column_name(),
            )?,
            gad_7_score: find_column(columns, NumericField::Gad7Score.column_name())?,
            phq_9_score: find_column(columns, NumericField::Phq9Score.column_name())?,
            primary_platform: find_column(columns, PRIMARY_PLATFORM_COLUMN)?,
            gad_7_severity: find_column(columns, GAD_7_SEVERITY_COLUMN)?,
        })
    }

    /// Position of a numeric field
    pub fn numeric(&self, field: NumericField) -> usize {
        match field {
            NumericField::Age => self.age,
            NumericField::DailyScreenTimeHours => self.daily_screen_time_hours,
            NumericField::SleepDurationHours => self.sleep_duration_hours,
            NumericField::Gad7Score => self.gad_7_score,
            NumericField::Phq9Score => self.phq_9_score,
        }
    }
}

fn find_column(columns: &[String], name: &str) -> Result<usize, SiftError> {
    columns
        .iter()
        .position(|c| c.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| SiftError::MissingColumn(name.to_string()))
}

/// A cell as read from the input; `None` marks a missing value
pub type RawCell = Option<String>;

/// Raw survey table: a header and one row of optional cells per respondent
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<RawCell>>,
    index: ColumnIndex,
}

impl RawTable {
    /// Build a table, resolving the required columns.
    ///
    /// Rows shorter than the header are padded with missing cells. Rows longer
    /// than the header are rejected.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<RawCell>>) -> Result<Self, SiftError> {
        let index = ColumnIndex::resolve(&columns)?;
        let width = columns.len();

        let mut padded = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(SiftError::RaggedRow {
                    row: i + 1,
                    expected: width,
                    found: row.len(),
                });
            }
            row.resize(width, None);
            padded.push(row);
        }

        Ok(Self {
            columns,
            rows: padded,
            index,
        })
    }

    pub(crate) fn from_parts(
        columns: Vec<String>,
        rows: Vec<Vec<RawCell>>,
        index: ColumnIndex,
    ) -> Self {
        Self {
            columns,
            rows,
            index,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<RawCell>] {
        &self.rows
    }

    pub fn index(&self) -> ColumnIndex {
        self.index
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Copy of this table without the derived screen time category column.
    ///
    /// Prepared output fed back into the pipeline carries the column; it is
    /// recomputed rather than treated as input.
    pub fn without_derived(&self) -> RawTable {
        let derived = self
            .columns
            .iter()
            .position(|c| c.trim().eq_ignore_ascii_case(SCREEN_TIME_CATEGORY_COLUMN));

        let Some(pos) = derived else {
            return self.clone();
        };

        let columns: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != pos)
            .map(|(_, c)| c.clone())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(i, _)| *i != pos)
                    .map(|(_, cell)| cell.clone())
                    .collect()
            })
            .collect();

        // Removing a column left of a known column shifts it by one
        let shift = |i: usize| if i > pos { i - 1 } else { i };
        let index = ColumnIndex {
            age: shift(self.index.age),
            daily_screen_time_hours: shift(self.index.daily_screen_time_hours),
            sleep_duration_hours: shift(self.index.sleep_duration_hours),
            gad_7_score: shift(self.index.gad_7_score),
            phq_9_score: shift(self.index.phq_9_score),
            primary_platform: shift(self.index.primary_platform),
            gad_7_severity: shift(self.index.gad_7_severity),
        };

        RawTable::from_parts(columns, rows, index)
    }
}

/// Row with every cell present (output of missing-value elimination)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompleteRow {
    pub cells: Vec<String>,
}

/// Numeric fields after coercion; `None` marks a value that failed to parse
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoercedNumerics {
    pub age: Option<f64>,
    pub daily_screen_time_hours: Option<f64>,
    pub sleep_duration_hours: Option<f64>,
    pub gad_7_score: Option<f64>,
    pub phq_9_score: Option<f64>,
}

impl CoercedNumerics {
    pub fn is_missing(&self, field: NumericField) -> bool {
        match field {
            NumericField::Age => self.age.is_none(),
            NumericField::DailyScreenTimeHours => self.daily_screen_time_hours.is_none(),
            NumericField::SleepDurationHours => self.sleep_duration_hours.is_none(),
            NumericField::Gad7Score => self.gad_7_score.is_none(),
            NumericField::Phq9Score => self.phq_9_score.is_none(),
        }
    }

    /// Fields that failed coercion
    pub fn missing_fields(&self) -> Vec<NumericField> {
        NumericField::ALL
            .into_iter()
            .filter(|f| self.is_missing(*f))
            .collect()
    }
}

/// Row after type normalization
#[derive(Debug, Clone, PartialEq)]
pub struct CoercedRow {
    /// Original cell text, preserved for output
    pub cells: Vec<String>,
    pub numerics: CoercedNumerics,
}

/// Validated respondent record (output of bounds filtering)
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub age: f64,
    pub daily_screen_time_hours: f64,
    pub sleep_duration_hours: f64,
    pub gad_7_score: f64,
    pub phq_9_score: f64,
    pub primary_platform: String,
    pub gad_7_severity: String,
    /// Every input cell, including columns the pipeline does not interpret
    pub cells: Vec<String>,
}

impl Record {
    pub fn numeric(&self, field: NumericField) -> f64 {
        match field {
            NumericField::Age => self.age,
            NumericField::DailyScreenTimeHours => self.daily_screen_time_hours,
            NumericField::SleepDurationHours => self.sleep_duration_hours,
            NumericField::Gad7Score => self.gad_7_score,
            NumericField::Phq9Score => self.phq_9_score,
        }
    }
}

/// Daily screen time bucket, ordered from lowest to highest usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScreenTimeCategory {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl ScreenTimeCategory {
    pub const ALL: [ScreenTimeCategory; 4] = [
        ScreenTimeCategory::Low,
        ScreenTimeCategory::Moderate,
        ScreenTimeCategory::High,
        ScreenTimeCategory::VeryHigh,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ScreenTimeCategory::Low => "Low",
            ScreenTimeCategory::Moderate => "Moderate",
            ScreenTimeCategory::High => "High",
            ScreenTimeCategory::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for ScreenTimeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Record with its derived screen time category
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRecord {
    pub record: Record,
    /// `None` when screen time falls outside every bin (e.g. exactly 0)
    pub screen_time_category: Option<ScreenTimeCategory>,
}

/// Output of the preparation pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTable {
    columns: Vec<String>,
    index: ColumnIndex,
    records: Vec<PreparedRecord>,
}

impl PreparedTable {
    pub(crate) fn new(
        columns: Vec<String>,
        index: ColumnIndex,
        records: Vec<PreparedRecord>,
    ) -> Self {
        Self {
            columns,
            index,
            records,
        }
    }

    pub fn records(&self) -> &[PreparedRecord] {
        &self.records
    }

    pub fn index(&self) -> ColumnIndex {
        self.index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Input columns, without the derived category
    pub fn input_columns(&self) -> &[String] {
        &self.columns
    }

    /// Input columns followed by the derived category column
    pub fn output_columns(&self) -> Vec<String> {
        let mut columns = self.columns.clone();
        columns.push(SCREEN_TIME_CATEGORY_COLUMN.to_string());
        columns
    }

    /// Render back to a raw table, category column last.
    ///
    /// Cell text is the original input text, so the result can be fed back
    /// through the pipeline unchanged.
    pub fn to_raw(&self) -> RawTable {
        let rows = self
            .records
            .iter()
            .map(|prepared| {
                let mut row: Vec<RawCell> =
                    prepared.record.cells.iter().cloned().map(Some).collect();
                row.push(prepared.screen_time_category.map(|c| c.label().to_string()));
                row
            })
            .collect();

        RawTable::from_parts(self.output_columns(), rows, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn survey_header() -> Vec<String> {
        header(&[
            "User_ID",
            "Age",
            "Daily_Screen_Time_Hours",
            "Sleep_Duration_Hours",
            "GAD_7_Score",
            "PHQ_9_Score",
            "Primary_Platform",
            "GAD_7_Severity",
        ])
    }

    #[test]
    fn test_resolve_case_insensitive() {
        let columns = header(&[
            "age",
            "daily_screen_time_hours",
            "sleep_duration_hours",
            "gad_7_score",
            "phq_9_score",
            "primary_platform",
            "gad_7_severity",
        ]);
        let index = ColumnIndex::resolve(&columns).unwrap();
        assert_eq!(index.age, 0);
        assert_eq!(index.gad_7_severity, 6);
        assert_eq!(index.numeric(NumericField::SleepDurationHours), 2);
    }

    #[test]
    fn test_missing_column_is_error() {
        let columns = header(&["Age", "Daily_Screen_Time_Hours"]);
        let err = ColumnIndex::resolve(&columns).unwrap_err();
        assert!(matches!(err, SiftError::MissingColumn(name) if name == "Sleep_Duration_Hours"));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = RawTable::new(survey_header(), vec![vec![Some("1".to_string())]]).unwrap();
        assert_eq!(table.rows()[0].len(), 8);
        assert!(table.rows()[0][1..].iter().all(Option::is_none));
    }

    #[test]
    fn test_long_rows_are_rejected() {
        let row = vec![Some("x".to_string()); 9];
        let err = RawTable::new(survey_header(), vec![row]).unwrap_err();
        assert!(matches!(
            err,
            SiftError::RaggedRow {
                row: 1,
                expected: 8,
                found: 9
            }
        ));
    }

    #[test]
    fn test_without_derived_shifts_index() {
        let mut columns = survey_header();
        columns.insert(1, SCREEN_TIME_CATEGORY_COLUMN.to_string());
        let row = vec![Some("v".to_string()); 9];
        let table = RawTable::new(columns, vec![row]).unwrap();
        assert_eq!(table.index().age, 2);

        let stripped = table.without_derived();
        assert_eq!(stripped.width(), 8);
        assert_eq!(stripped.index().age, 1);
        assert_eq!(stripped.index().gad_7_severity, 7);
        assert_eq!(stripped.rows()[0].len(), 8);
    }

    #[test]
    fn test_category_ordering_and_labels() {
        assert!(ScreenTimeCategory::Low < ScreenTimeCategory::VeryHigh);
        assert_eq!(ScreenTimeCategory::VeryHigh.to_string(), "Very High");
        assert_eq!(
            serde_json::to_string(&ScreenTimeCategory::VeryHigh).unwrap(),
            "\"Very High\""
        );
    }

    #[test]
    fn test_missing_fields() {
        let numerics = CoercedNumerics {
            age: Some(20.0),
            daily_screen_time_hours: None,
            sleep_duration_hours: Some(7.0),
            gad_7_score: Some(3.0),
            phq_9_score: None,
        };
        assert_eq!(
            numerics.missing_fields(),
            vec![NumericField::DailyScreenTimeHours, NumericField::Phq9Score]
        );
    }
}
