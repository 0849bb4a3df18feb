use std::collections::{HashMap, HashSet};
use std::fmt;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::NormalizeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewKind {
    Channel,
    Pod,
}

impl ViewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Channel => "channel",
            ViewKind::Pod => "pod",
        }
    }

    /// Name of the worksheet this view is read from.
    pub fn worksheet_name(&self) -> &'static str {
        match self {
            ViewKind::Channel => "Channel-View",
            ViewKind::Pod => "POD-View",
        }
    }

    /// Name assigned to blank header cells; also the key column of the
    /// resulting table.
    pub fn key_name(&self) -> &'static str {
        match self {
            ViewKind::Channel => "Channel",
            ViewKind::Pod => "POD",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ViewKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "channel" | "channel-view" => Ok(ViewKind::Channel),
            "pod" | "pod-view" => Ok(ViewKind::Pod),
            other => Err(format!("unknown view '{other}'")),
        }
    }
}

/// A worksheet exactly as handed over by the fetch collaborator: rows of raw
/// text cells. Row 0 is the title row, row 1 the header, rows 2+ the data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGrid(pub Vec<Vec<String>>);

impl RawGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self(rows)
    }

    /// Reads a CSV export of a worksheet into a grid. Rows may have uneven
    /// lengths; nothing is interpreted here beyond cell boundaries.
    pub fn from_csv(content: &str) -> Result<Self, NormalizeError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }
        Ok(Self(rows))
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Vec<String>>> for RawGrid {
    fn from(rows: Vec<Vec<String>>) -> Self {
        Self(rows)
    }
}

/// One group row: the key plus every non-key column parsed to an optional
/// number. `None` means the cell was blank or not numeric; turning missing
/// values into zeros is the calculator's call, not the parser's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    key: String,
    fields: HashMap<String, Option<f64>>,
}

impl GroupRecord {
    pub(crate) fn new(key: String, fields: HashMap<String, Option<f64>>) -> Self {
        Self { key, fields }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The parsed value of a column, flattened: `None` when the column is
    /// absent or its cell did not parse.
    pub fn value(&self, column: &str) -> Option<f64> {
        self.fields.get(column).copied().flatten()
    }

    /// The un-flattened cell state: outer `None` when the column is absent,
    /// inner `None` when the cell was blank or unparsable.
    pub fn cell(&self, column: &str) -> Option<Option<f64>> {
        self.fields.get(column).copied()
    }
}

/// The normalized table for one worksheet view: a fixed column schema derived
/// from the header row plus the surviving data rows in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanTable {
    key_name: String,
    columns: Vec<String>,
    records: Vec<GroupRecord>,
}

impl CleanTable {
    pub(crate) fn new(key_name: String, columns: Vec<String>, records: Vec<GroupRecord>) -> Self {
        Self {
            key_name,
            columns,
            records,
        }
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Derived column names, verbatim and positional. Collided names appear
    /// once per position they were derived at.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Unique non-key column names in first-occurrence order. When a name was
    /// derived at more than one position, the value stored under it is the
    /// last position's (last write wins), while its place in the sequence is
    /// the first position's.
    pub fn field_columns(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|name| *name != self.key_name && seen.insert(*name))
            .collect()
    }

    pub fn records(&self) -> &[GroupRecord] {
        &self.records
    }

    /// First record whose key matches exactly.
    pub fn find(&self, key: &str) -> Option<&GroupRecord> {
        self.records.iter().find(|record| record.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Columnar view of the table for the render surface: the key column as
    /// strings, every field column as nullable floats.
    pub fn to_dataframe(&self) -> Result<DataFrame, PolarsError> {
        let keys: Vec<&str> = self.records.iter().map(|record| record.key()).collect();

        let mut cols: Vec<Column> = Vec::with_capacity(self.field_columns().len() + 1);
        cols.push(Series::new(self.key_name.as_str().into(), keys).into());

        for name in self.field_columns() {
            let values: Vec<Option<f64>> = self
                .records
                .iter()
                .map(|record| record.value(name))
                .collect();
            cols.push(Series::new(name.into(), values).into());
        }

        DataFrame::new(cols)
    }
}
