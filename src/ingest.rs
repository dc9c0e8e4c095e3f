//! Delimited-text ingestion and output
//!
//! Reading is the only place where structural problems surface as errors. Cell
//! level problems are left for the pipeline: blank cells and configured missing
//! tokens become `None`, everything else is kept verbatim.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde_json::{Map, Value};

use crate::config::SiftConfig;
use crate::error::SiftError;
use crate::types::{
    NumericField, NumericKind, PreparedTable, RawCell, RawTable, SCREEN_TIME_CATEGORY_COLUMN,
};

/// Reader for survey tables
pub struct TableReader;

impl TableReader {
    /// Parse a table held in memory
    pub fn parse_str(text: &str, config: &SiftConfig) -> Result<RawTable, SiftError> {
        Self::from_reader(text.as_bytes(), config)
    }

    /// Read a table from a file
    pub fn from_path(path: &Path, config: &SiftConfig) -> Result<RawTable, SiftError> {
        let file = File::open(path)?;
        Self::from_reader(file, config)
    }

    /// Read a table from any byte source
    pub fn from_reader<R: Read>(reader: R, config: &SiftConfig) -> Result<RawTable, SiftError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(config.delimiter_byte())
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let row: Vec<RawCell> = record
                .iter()
                .map(|cell| {
                    if config.is_missing_token(cell) {
                        None
                    } else {
                        Some(cell.to_string())
                    }
                })
                .collect();
            rows.push(row);
        }

        let table = RawTable::new(columns, rows)?;
        tracing::debug!(rows = table.len(), columns = table.width(), "table ingested");
        Ok(table)
    }
}

/// Writers for prepared output
pub struct TableWriter;

impl TableWriter {
    /// Write a table as delimited text; missing cells are written empty
    pub fn write_csv<W: Write>(
        table: &RawTable,
        writer: W,
        delimiter: u8,
    ) -> Result<(), SiftError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);

        csv_writer.write_record(table.columns())?;
        for row in table.rows() {
            csv_writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Render a table as a delimited-text string
    pub fn to_csv_string(table: &RawTable, delimiter: u8) -> Result<String, SiftError> {
        let mut buffer = Vec::new();
        Self::write_csv(table, &mut buffer, delimiter)?;
        String::from_utf8(buffer).map_err(|e| SiftError::EncodingError(e.to_string()))
    }

    /// One JSON object per prepared record, keyed by column name.
    ///
    /// Numeric fields are emitted as numbers, other columns as strings, and an
    /// unlabeled screen time category as `null`. Whole values of integer-valued
    /// fields are written without a fractional part.
    pub fn to_json_rows(table: &PreparedTable) -> Vec<Value> {
        let index = table.index();
        let columns = table.input_columns();

        table
            .records()
            .iter()
            .map(|prepared| {
                let record = &prepared.record;
                let mut object = Map::new();

                for (i, column) in columns.iter().enumerate() {
                    let field = NumericField::ALL
                        .into_iter()
                        .find(|f| index.numeric(*f) == i);
                    let value = match field {
                        Some(field) => numeric_value(field, record.numeric(field)),
                        None => Value::from(record.cells[i].clone()),
                    };
                    object.insert(column.clone(), value);
                }

                let category = prepared
                    .screen_time_category
                    .map(|c| Value::from(c.label()))
                    .unwrap_or(Value::Null);
                object.insert(SCREEN_TIME_CATEGORY_COLUMN.to_string(), category);

                Value::Object(object)
            })
            .collect()
    }
}

fn numeric_value(field: NumericField, value: f64) -> Value {
    let whole = value.fract() == 0.0 && value.abs() < i64::MAX as f64;
    match field.kind() {
        NumericKind::Integer if whole => Value::from(value as i64),
        _ => Value::from(value),
    }
}
