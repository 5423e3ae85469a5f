//! Fatal error conditions.
//!
//! Everything that can go wrong with a single event (unknown names,
//! ambiguous names, unparsed descriptions) is recorded as an [`Issue`]
//! and never surfaces here. Only structural problems with the input
//! tables abort a run.
//!
//! [`Issue`]: crate::types::Issue

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PbpError {
    #[error("{table} table is missing required column '{column}' (columns: {available:?})")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
        available: Vec<String>,
    },

    #[error("{table} table row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        table: &'static str,
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("Alias JSON error: {0}")]
    AliasJson(#[from] serde_json::Error),
}

impl PbpError {
    /// Convenience constructor used by the table decoders.
    pub fn missing_column(table: &'static str, column: &'static str, headers: &[String]) -> Self {
        PbpError::MissingColumn {
            table,
            column,
            available: headers.to_vec(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PbpError>;
