//! Feature derivation
//!
//! This module derives the screen time category from validated records.
//! Bins are right-closed and left-open:
//! - (0, 2] Low
//! - (2, 5] Moderate
//! - (5, 8] High
//! - (8, 16] Very High
//!
//! A value outside every bin (exactly 0, or anything above 16 under a relaxed
//! bounds policy) stays unlabeled.

use crate::types::{PreparedRecord, Record, ScreenTimeCategory};

/// Bin edges in hours; bin `i` spans `(EDGES[i], EDGES[i + 1]]`
pub const SCREEN_TIME_BIN_EDGES: [f64; 5] = [0.0, 2.0, 5.0, 8.0, 16.0];

/// Feature deriver for the screen time category
pub struct FeatureDeriver;

impl FeatureDeriver {
    /// Attach a category to every record; no record is dropped
    pub fn derive(records: Vec<Record>) -> Vec<PreparedRecord> {
        records
            .into_iter()
            .map(|record| PreparedRecord {
                screen_time_category: categorize_screen_time(record.daily_screen_time_hours),
                record,
            })
            .collect()
    }
}

/// Bin a daily screen time value
pub fn categorize_screen_time(hours: f64) -> Option<ScreenTimeCategory> {
    SCREEN_TIME_BIN_EDGES
        .windows(2)
        .zip(ScreenTimeCategory::ALL)
        .find(|(edges, _)| hours > edges[0] && hours <= edges[1])
        .map(|(_, category)| category)
}
