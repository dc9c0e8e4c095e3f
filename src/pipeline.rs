//! Pipeline orchestration
//!
//! This module provides the public API for Synheart Sift.
//! It runs the five preparation stages in order over an immutable raw table
//! and produces a new prepared table.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::bounds::{BoundsFilter, BoundsRejections};
use crate::cleaning::{Deduplicator, MissingValueFilter};
use crate::coercion::TypeNormalizer;
use crate::config::SiftConfig;
use crate::features::FeatureDeriver;
use crate::types::{NumericField, PreparedTable, RawTable};

/// Prepare a raw survey table with the default configuration.
///
/// Total and deterministic: malformed cells are coerced to missing and
/// filtered, and an empty result is a valid result.
///
/// # Arguments
/// * `raw` - Table as read by `TableReader`
///
/// # Returns
/// Prepared table with the input columns followed by `Screen_Time_Category`
///
/// # Example
/// ```ignore
/// let raw = TableReader::from_path(path, &SiftConfig::default())?;
/// let prepared = prepare(&raw);
/// ```
pub fn prepare(raw: &RawTable) -> PreparedTable {
    Preparer::default().prepare(raw).table
}

/// Pipeline stage identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    MissingValues,
    Duplicates,
    TypeNormalization,
    Bounds,
    Categories,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::MissingValues => "missing_values",
            Stage::Duplicates => "duplicates",
            Stage::TypeNormalization => "type_normalization",
            Stage::Bounds => "bounds",
            Stage::Categories => "categories",
        }
    }
}

/// Row counts entering and leaving a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub rows_in: usize,
    pub rows_out: usize,
}

impl StageReport {
    pub fn dropped(&self) -> usize {
        self.rows_in - self.rows_out
    }
}

/// Diagnostics gathered over one preparation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub stages: Vec<StageReport>,
    /// Rows removed as exact duplicates
    pub duplicates_removed: usize,
    /// Cells that could not be read as numbers, per field
    pub coercion_failures: BTreeMap<NumericField, usize>,
    pub bounds_rejections: BoundsRejections,
    /// Records whose screen time fell outside every category bin
    pub unlabeled: usize,
}

impl PipelineReport {
    pub fn rows_in(&self) -> usize {
        self.stages.first().map(|s| s.rows_in).unwrap_or(0)
    }

    pub fn rows_out(&self) -> usize {
        self.stages.last().map(|s| s.rows_out).unwrap_or(0)
    }
}

/// Prepared table together with its run report
#[derive(Debug, Clone)]
pub struct Prepared {
    pub table: PreparedTable,
    pub report: PipelineReport,
}

/// Configurable pipeline runner
pub struct Preparer {
    bounds: BoundsFilter,
}

impl Default for Preparer {
    fn default() -> Self {
        Self::new(&SiftConfig::default())
    }
}

impl Preparer {
    /// Create a runner using the bounds of `config`
    pub fn new(config: &SiftConfig) -> Self {
        Self {
            bounds: BoundsFilter::new(config.bounds),
        }
    }

    /// Run every stage over `raw`.
    ///
    /// # Arguments
    /// * `raw` - Table as read by `TableReader`; left untouched
    ///
    /// # Returns
    /// The prepared table and a report of rows in and out of each stage
    ///
    /// Stages:
    /// 1. MissingValueFilter - Drop rows with any missing cell
    /// 2. Deduplicator - Collapse exact duplicate rows
    /// 3. TypeNormalizer - Coerce numeric fields, unparseable to missing
    /// 4. BoundsFilter - Drop missing or infinite numerics and implausible values
    /// 5. FeatureDeriver - Attach the screen time category
    pub fn prepare(&self, raw: &RawTable) -> Prepared {
        // A derived column from an earlier run is recomputed, not treated as input
        let raw = raw.without_derived();
        let index = raw.index();
        let mut stages = Vec::with_capacity(5);

        // Stage 1: Missing values
        let complete = MissingValueFilter::apply(&raw);
        stages.push(record_stage(Stage::MissingValues, raw.len(), complete.len()));

        // Stage 2: Duplicates
        let before_dedup = complete.len();
        let unique = Deduplicator::apply(complete);
        stages.push(record_stage(Stage::Duplicates, before_dedup, unique.len()));

        // Stage 3: Type normalization
        let before_coercion = unique.len();
        let (coerced, coercion_failures) = TypeNormalizer::apply(unique, &index);
        stages.push(record_stage(
            Stage::TypeNormalization,
            before_coercion,
            coerced.len(),
        ));

        // Stage 4: Bounds
        let before_bounds = coerced.len();
        let (records, bounds_rejections) = self.bounds.apply(coerced, &index);
        stages.push(record_stage(Stage::Bounds, before_bounds, records.len()));

        // Stage 5: Categories
        let before_categories = records.len();
        let prepared = FeatureDeriver::derive(records);
        stages.push(record_stage(
            Stage::Categories,
            before_categories,
            prepared.len(),
        ));

        let unlabeled = prepared
            .iter()
            .filter(|r| r.screen_time_category.is_none())
            .count();

        let report = PipelineReport {
            duplicates_removed: stages[1].dropped(),
            stages,
            coercion_failures,
            bounds_rejections,
            unlabeled,
        };

        if prepared.is_empty() && !raw.is_empty() {
            tracing::warn!(rows_in = raw.len(), "every row was filtered out");
        }
        if unlabeled > 0 {
            tracing::debug!(unlabeled, "records outside every screen time bin");
        }
        tracing::info!(
            rows_in = report.rows_in(),
            rows_out = report.rows_out(),
            duplicates_removed = report.duplicates_removed,
            "dataset prepared"
        );

        Prepared {
            table: PreparedTable::new(raw.columns().to_vec(), index, prepared),
            report,
        }
    }
}

fn record_stage(stage: Stage, rows_in: usize, rows_out: usize) -> StageReport {
    tracing::debug!(stage = stage.as_str(), rows_in, rows_out, "stage complete");
    StageReport {
        stage,
        rows_in,
        rows_out,
    }
}
