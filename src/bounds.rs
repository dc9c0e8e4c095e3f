//! Outlier bounds
//!
//! Fixed plausibility thresholds rather than statistically derived ones. A row
//! is kept only when every numeric field is present and finite and both bounds
//! hold. A comparison against a missing value never keeps the row.

use serde::Serialize;

use crate::config::BoundsPolicy;
use crate::types::{CoercedRow, ColumnIndex, Record};

/// Why rows were rejected by the bounds filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoundsRejections {
    /// At least one numeric field failed coercion
    pub missing_numeric: usize,
    /// At least one numeric field is infinite
    pub non_finite: usize,
    pub screen_time_out_of_bounds: usize,
    pub sleep_out_of_bounds: usize,
}

impl BoundsRejections {
    pub fn total(&self) -> usize {
        self.missing_numeric
            + self.non_finite
            + self.screen_time_out_of_bounds
            + self.sleep_out_of_bounds
    }
}

/// Applies the bounds policy to coerced rows
pub struct BoundsFilter {
    policy: BoundsPolicy,
}

impl Default for BoundsFilter {
    fn default() -> Self {
        Self::new(BoundsPolicy::default())
    }
}

impl BoundsFilter {
    pub fn new(policy: BoundsPolicy) -> Self {
        Self { policy }
    }

    /// Keep rows within bounds, turning them into typed records
    pub fn apply(
        &self,
        rows: Vec<CoercedRow>,
        index: &ColumnIndex,
    ) -> (Vec<Record>, BoundsRejections) {
        let mut rejections = BoundsRejections::default();
        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            let n = row.numerics;
            let (Some(age), Some(screen), Some(sleep), Some(gad), Some(phq)) = (
                n.age,
                n.daily_screen_time_hours,
                n.sleep_duration_hours,
                n.gad_7_score,
                n.phq_9_score,
            ) else {
                rejections.missing_numeric += 1;
                continue;
            };

            if ![age, screen, sleep, gad, phq].iter().all(|v| v.is_finite()) {
                rejections.non_finite += 1;
                continue;
            }

            if !self.screen_time_ok(screen) {
                rejections.screen_time_out_of_bounds += 1;
                continue;
            }
            if !self.sleep_ok(sleep) {
                rejections.sleep_out_of_bounds += 1;
                continue;
            }

            records.push(Record {
                age,
                daily_screen_time_hours: screen,
                sleep_duration_hours: sleep,
                gad_7_score: gad,
                phq_9_score: phq,
                primary_platform: row.cells[index.primary_platform].clone(),
                gad_7_severity: row.cells[index.gad_7_severity].clone(),
                cells: row.cells,
            });
        }

        (records, rejections)
    }

    /// Screen time at or below the ceiling
    pub fn screen_time_ok(&self, hours: f64) -> bool {
        hours <= self.policy.max_screen_time_hours
    }

    /// Sleep duration within the inclusive range
    pub fn sleep_ok(&self, hours: f64) -> bool {
        hours >= self.policy.min_sleep_hours && hours <= self.policy.max_sleep_hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CoercedNumerics;

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

    fn coerced(screen: Option<f64>, sleep: Option<f64>) -> CoercedRow {
        CoercedRow {
            cells: vec![
                "25".to_string(),
                screen.map(|v| v.to_string()).unwrap_or_default(),
                sleep.map(|v| v.to_string()).unwrap_or_default(),
                "5".to_string(),
                "4".to_string(),
                "Instagram".to_string(),
                "Mild".to_string(),
            ],
            numerics: CoercedNumerics {
                age: Some(25.0),
                daily_screen_time_hours: screen,
                sleep_duration_hours: sleep,
                gad_7_score: Some(5.0),
                phq_9_score: Some(4.0),
            },
        }
    }

    #[test]
    fn test_edges_inclusive() {
        let filter = BoundsFilter::default();
        assert!(filter.screen_time_ok(16.0));
        assert!(!filter.screen_time_ok(16.01));
        assert!(filter.screen_time_ok(0.0));
        assert!(filter.sleep_ok(2.0));
        assert!(filter.sleep_ok(12.0));
        assert!(!filter.sleep_ok(1.99));
        assert!(!filter.sleep_ok(12.5));
    }

    #[test]
    fn test_apply_counts_reasons() {
        let rows = vec![
            coerced(Some(4.0), Some(7.0)),
            coerced(Some(20.0), Some(7.0)),
            coerced(Some(4.0), Some(1.0)),
            coerced(None, Some(7.0)),
            coerced(Some(16.0), Some(12.0)),
        ];

        let (records, rejections) = BoundsFilter::default().apply(rows, &index());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].daily_screen_time_hours, 4.0);
        assert_eq!(records[0].primary_platform, "Instagram");
        assert_eq!(records[0].gad_7_severity, "Mild");
        assert_eq!(records[1].daily_screen_time_hours, 16.0);
        assert_eq!(
            rejections,
            BoundsRejections {
                missing_numeric: 1,
                non_finite: 0,
                screen_time_out_of_bounds: 1,
                sleep_out_of_bounds: 1,
            }
        );
        assert_eq!(rejections.total(), 3);
    }

    #[test]
    fn test_missing_non_bounded_field_excludes_row() {
        let mut row = coerced(Some(4.0), Some(7.0));
        row.numerics.age = None;

        let (records, rejections) = BoundsFilter::default().apply(vec![row], &index());

        assert!(records.is_empty());
        assert_eq!(rejections.missing_numeric, 1);
    }

    #[test]
    fn test_non_finite_excludes_row() {
        let mut infinite_age = coerced(Some(4.0), Some(7.0));
        infinite_age.numerics.age = Some(f64::INFINITY);
        let negative_screen = coerced(Some(f64::NEG_INFINITY), Some(7.0));
        let rows = vec![infinite_age, negative_screen, coerced(Some(4.0), Some(7.0))];

        let (records, rejections) = BoundsFilter::default().apply(rows, &index());

        assert_eq!(records.len(), 1);
        assert_eq!(rejections.non_finite, 2);
        assert_eq!(rejections.total(), 2);
    }

    #[test]
    fn test_fractional_scores_pass() {
        let mut row = coerced(Some(4.0), Some(7.0));
        row.numerics.age = Some(25.5);
        row.numerics.gad_7_score = Some(5.5);

        let (records, _) = BoundsFilter::default().apply(vec![row], &index());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].age, 25.5);
        assert_eq!(records[0].gad_7_score, 5.5);
    }

    #[test]
    fn test_custom_policy() {
        let filter = BoundsFilter::new(BoundsPolicy {
            max_screen_time_hours: 10.0,
            min_sleep_hours: 4.0,
            max_sleep_hours: 9.0,
        });
        assert!(!filter.screen_time_ok(12.0));
        assert!(!filter.sleep_ok(3.0));
        assert!(filter.sleep_ok(9.0));
    }
}
