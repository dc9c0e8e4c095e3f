//! Type normalization
//!
//! Coerces the numeric survey fields. Every field is read as a real number, so
//! `25.5` in an integer-valued column such as `Age` is kept. A cell that cannot
//! be read as a number becomes missing; it is never an error. Original cell
//! text is kept so the prepared table can be written back out verbatim.

use std::collections::BTreeMap;

use crate::types::{CoercedNumerics, CoercedRow, ColumnIndex, CompleteRow, NumericField};

/// Coerces numeric fields of complete rows
pub struct TypeNormalizer;

impl TypeNormalizer {
    /// Coerce every row, returning failure counts per field alongside.
    pub fn apply(
        rows: Vec<CompleteRow>,
        index: &ColumnIndex,
    ) -> (Vec<CoercedRow>, BTreeMap<NumericField, usize>) {
        let mut failures: BTreeMap<NumericField, usize> = BTreeMap::new();

        let coerced = rows
            .into_iter()
            .map(|row| {
                let numerics = coerce_numerics(&row.cells, index);
                for field in numerics.missing_fields() {
                    *failures.entry(field).or_insert(0) += 1;
                }
                CoercedRow {
                    cells: row.cells,
                    numerics,
                }
            })
            .collect();

        (coerced, failures)
    }
}

fn coerce_numerics(cells: &[String], index: &ColumnIndex) -> CoercedNumerics {
    let cell = |field: NumericField| cells[index.numeric(field)].as_str();

    CoercedNumerics {
        age: parse_real(cell(NumericField::Age)),
        daily_screen_time_hours: parse_real(cell(NumericField::DailyScreenTimeHours)),
        sleep_duration_hours: parse_real(cell(NumericField::SleepDurationHours)),
        gad_7_score: parse_real(cell(NumericField::Gad7Score)),
        phq_9_score: parse_real(cell(NumericField::Phq9Score)),
    }
}

/// Parse a real number.
///
/// Infinities parse; a `NaN` spelling is the absence of a number and counts
/// as unparseable.
pub fn parse_real(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> ColumnIndex {
        ColumnIndex {
            age: 0,
            daily_screen_time_hours: 1,
            sleep_duration_hours: 2,
            gad_7_score: 3,
            phq_9_score: 4,
            primary_platform: 5,
            gad_7_severity: 6,
        }
    }

    fn complete(cells: [&str; 7]) -> CompleteRow {
        CompleteRow {
            cells: cells.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_real() {
        assert_eq!(parse_real("4.5"), Some(4.5));
        assert_eq!(parse_real(" 7 "), Some(7.0));
        assert_eq!(parse_real("1e1"), Some(10.0));
        assert_eq!(parse_real("-2"), Some(-2.0));
        assert_eq!(parse_real("25.5"), Some(25.5));
        assert_eq!(parse_real("four"), None);
        assert_eq!(parse_real("4,5"), None);
    }

    #[test]
    fn test_parse_real_non_finite() {
        assert_eq!(parse_real("inf"), Some(f64::INFINITY));
        assert_eq!(parse_real("-inf"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_real("NaN"), None);
    }

    #[test]
    fn test_fractional_integer_field_is_kept() {
        let rows = vec![complete(["25.5", "3", "7", "5.5", "4", "Instagram", "Mild"])];

        let (coerced, failures) = TypeNormalizer::apply(rows, &index());

        assert_eq!(coerced[0].numerics.age, Some(25.5));
        assert_eq!(coerced[0].numerics.gad_7_score, Some(5.5));
        assert!(failures.is_empty());
    }

    #[test]
    fn test_apply_keeps_text_and_counts_failures() {
        let rows = vec![
            complete(["21", "3.5", "7", "5", "4", "Instagram", "Mild"]),
            complete(["abc", "3.5", "seven", "5", "4", "Instagram", "Mild"]),
            complete(["40", "x", "7", "5", "4.2", "TikTok", "Mild"]),
        ];

        let (coerced, failures) = TypeNormalizer::apply(rows, &index());

        assert_eq!(coerced.len(), 3);
        assert_eq!(coerced[0].numerics.age, Some(21.0));
        assert_eq!(coerced[0].numerics.daily_screen_time_hours, Some(3.5));
        assert!(coerced[0].numerics.missing_fields().is_empty());

        assert_eq!(coerced[1].cells[0], "abc");
        assert_eq!(coerced[1].numerics.age, None);
        assert_eq!(coerced[1].numerics.sleep_duration_hours, None);

        assert_eq!(failures.get(&NumericField::Age), Some(&1));
        assert_eq!(failures.get(&NumericField::SleepDurationHours), Some(&1));
        assert_eq!(failures.get(&NumericField::DailyScreenTimeHours), Some(&1));
        assert_eq!(coerced[2].numerics.phq_9_score, Some(4.2));
        assert_eq!(failures.get(&NumericField::Phq9Score), None);
        assert_eq!(failures.get(&NumericField::Gad7Score), None);
    }
}
