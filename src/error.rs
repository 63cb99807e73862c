//! Domain errors raised by the reconciliation pipeline.
//!
//! Every variant is terminal: a run that hits one of these produces no partial
//! output. Silent coercions (unparseable quantities, unmapped orders, duplicate
//! labels) are not errors and are reported through
//! [`Diagnostics`](crate::reconcile::Diagnostics) instead.

use std::{fmt, path::PathBuf};

use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;

/// The input table a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Movements,
    Mapping,
    Manual,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Movements => "movements",
            TableKind::Mapping => "mapping",
            TableKind::Manual => "manual",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A semantic column that could not be located on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingColumn {
    pub table: TableKind,
    pub role: String,
}

impl MissingColumn {
    pub fn new(table: TableKind, role: impl Into<String>) -> Self {
        Self {
            table,
            role: role.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconError {
    #[error("required column(s) not found ({}); check the header row of each input", describe_missing(.0))]
    InputShape(Vec<MissingColumn>),
    #[error("could not read {table} table: {message}")]
    Parse { table: TableKind, message: String },
    #[error("could not open {table} input {path:?}")]
    Io {
        table: TableKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ReconError {
    pub fn parse(table: TableKind, message: impl Into<String>) -> Self {
        ReconError::Parse {
            table,
            message: message.into(),
        }
    }

    /// Missing columns carried by an [`ReconError::InputShape`] error.
    pub fn missing_columns(&self) -> &[MissingColumn] {
        match self {
            ReconError::InputShape(missing) => missing,
            _ => &[],
        }
    }
}

/// Groups missing roles per table, e.g. `movements: material_id, quantity; mapping: line`.
fn describe_missing(missing: &[MissingColumn]) -> String {
    missing
        .iter()
        .chunk_by(|entry| entry.table)
        .into_iter()
        .map(|(table, entries)| format!("{table}: {}", entries.map(|e| e.role.as_str()).join(", ")))
        .join("; ")
}
