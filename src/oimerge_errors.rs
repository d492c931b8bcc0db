use thiserror::Error;

use crate::model::OIFitsStandard;

#[derive(Error, Debug, PartialEq)]
pub enum MergeError {
    #[error("Merge: invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid merge parameter: {0}")]
    InvalidMergeParameter(String),

    #[error("Table {ext_name} is not allowed in {version} files")]
    UnsupportedTable {
        ext_name: &'static str,
        version: OIFitsStandard,
    },

    #[error("Duplicate {ext_name} table name: {name}")]
    DuplicateTableName { ext_name: &'static str, name: String },

    #[error("An OI_TARGET table is already present")]
    MultipleTargetTables,

    #[error("Unknown table reference: file #{file}, table #{table}")]
    UnknownTable { file: usize, table: usize },

    #[error("Column {column} has {actual} rows, expected {expected}")]
    InconsistentColumn {
        column: String,
        expected: usize,
        actual: usize,
    },
}
