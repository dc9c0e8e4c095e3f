//! Synheart Sift - Dataset preparation for screen time and mental health surveys
//!
//! Sift turns a raw survey table into an analysis-ready one through a
//! deterministic pipeline: missing-value elimination → duplicate elimination →
//! type normalization → outlier bounds → screen time categories.
//!
//! ## Modules
//!
//! - **Pipeline**: `prepare` and the configurable `Preparer`
//! - **Reporting**: table summaries and the four descriptive charts, encoded
//!   as Vega-Lite documents

pub mod bounds;
pub mod charts;
pub mod cleaning;
pub mod coercion;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod ingest;
pub mod pipeline;
pub mod summary;
pub mod types;

pub use config::SiftConfig;
pub use error::SiftError;
pub use ingest::{TableReader, TableWriter};
pub use pipeline::{prepare, PipelineReport, Prepared, Preparer};
pub use types::{PreparedRecord, PreparedTable, RawTable, Record, ScreenTimeCategory};

// Reporting exports
pub use charts::{ChartKind, ChartSet};
pub use encoder::ArtifactEncoder;
pub use summary::TableSummary;

/// Sift version embedded in every artifact
pub const SIFT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for artifacts
pub const PRODUCER_NAME: &str = "synheart-sift";
