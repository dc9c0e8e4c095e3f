//! Pipeline configuration
//!
//! Defaults reproduce the thresholds used for the survey study. A TOML file can
//! override any subset of them:
//!
//! ```toml
//! delimiter = ";"
//!
//! [bounds]
//! max_screen_time_hours = 14.0
//!
//! [report]
//! histogram_bins = 20
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::SiftError;

/// Cell values treated as missing, in addition to empty cells.
///
/// Mirrors the NA markers common survey exports use.
pub const DEFAULT_MISSING_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    /// Field delimiter of the input table
    pub delimiter: char,
    /// Cell values treated as missing
    pub missing_tokens: Vec<String>,
    pub bounds: BoundsPolicy,
    pub report: ReportConfig,
}

impl Default for SiftConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            missing_tokens: DEFAULT_MISSING_TOKENS.iter().map(|s| s.to_string()).collect(),
            bounds: BoundsPolicy::default(),
            report: ReportConfig::default(),
        }
    }
}

/// Fixed plausibility thresholds for the outlier stage (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsPolicy {
    pub max_screen_time_hours: f64,
    pub min_sleep_hours: f64,
    pub max_sleep_hours: f64,
}

impl Default for BoundsPolicy {
    fn default() -> Self {
        Self {
            max_screen_time_hours: 16.0,
            min_sleep_hours: 2.0,
            max_sleep_hours: 12.0,
        }
    }
}

/// Console and chart settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Rows shown in the head preview
    pub head_rows: usize,
    /// Bins in the screen time histogram
    pub histogram_bins: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            head_rows: 5,
            histogram_bins: 30,
        }
    }
}

impl SiftConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(toml_str: &str) -> Result<Self, SiftError> {
        let config: SiftConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_path(path: &Path) -> Result<Self, SiftError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), SiftError> {
        if !self.delimiter.is_ascii() || self.delimiter == '"' || self.delimiter == '\n' {
            return Err(SiftError::InvalidConfig(format!(
                "delimiter must be a single ASCII character other than quote or newline, got {:?}",
                self.delimiter
            )));
        }

        let b = &self.bounds;
        if ![b.max_screen_time_hours, b.min_sleep_hours, b.max_sleep_hours]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(SiftError::InvalidConfig(
                "bounds must be finite numbers".to_string(),
            ));
        }
        if b.min_sleep_hours > b.max_sleep_hours {
            return Err(SiftError::InvalidConfig(format!(
                "min_sleep_hours ({}) exceeds max_sleep_hours ({})",
                b.min_sleep_hours, b.max_sleep_hours
            )));
        }

        if self.report.histogram_bins == 0 {
            return Err(SiftError::InvalidConfig(
                "histogram_bins must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Delimiter as the byte expected by the CSV reader
    pub fn delimiter_byte(&self) -> u8 {
        // validate() guarantees ASCII
        self.delimiter as u8
    }

    /// Whether a cell's text marks a missing value
    pub fn is_missing_token(&self, cell: &str) -> bool {
        let trimmed = cell.trim();
        trimmed.is_empty() || self.missing_tokens.iter().any(|t| t == trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SiftConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bounds.max_screen_time_hours, 16.0);
        assert_eq!(config.report.histogram_bins, 30);
        assert_eq!(config.delimiter_byte(), b',');
    }

    #[test]
    fn test_partial_override() {
        let config = SiftConfig::from_toml_str(
            r#"
            delimiter = ";"

            [bounds]
            max_screen_time_hours = 14.0
            "#,
        )
        .unwrap();

        assert_eq!(config.delimiter, ';');
        assert_eq!(config.bounds.max_screen_time_hours, 14.0);
        assert_eq!(config.bounds.min_sleep_hours, 2.0);
        assert_eq!(config.report.head_rows, 5);
    }

    #[test]
    fn test_inverted_sleep_bounds_rejected() {
        let result = SiftConfig::from_toml_str(
            r#"
            [bounds]
            min_sleep_hours = 9.0
            max_sleep_hours = 4.0
            "#,
        );
        assert!(matches!(result, Err(SiftError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_bins_rejected() {
        let result = SiftConfig::from_toml_str("[report]\nhistogram_bins = 0\n");
        assert!(matches!(result, Err(SiftError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result = SiftConfig::from_toml_str("bounds = ");
        assert!(matches!(result, Err(SiftError::ConfigParseError(_))));
    }

    #[test]
    fn test_missing_tokens() {
        let config = SiftConfig::default();
        assert!(config.is_missing_token(""));
        assert!(config.is_missing_token("   "));
        assert!(config.is_missing_token("NA"));
        assert!(config.is_missing_token(" NaN "));
        assert!(!config.is_missing_token("abc"));
        assert!(!config.is_missing_token("0"));
    }
}
