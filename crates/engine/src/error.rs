//! Errors surfaced by the engine.
//!
//! Every operation returns a typed [`EngineError`] instead of panicking, so
//! the HTTP layer can map each variant to a specific response. Statement
//! parsing has its own [`StatementError`] to keep "wrong format" distinct
//! from "right format, no data".

use sea_orm::DbErr;
use thiserror::Error;

/// Errors produced by the CSV statement parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatementError {
    /// No header row with a recognizable date column was found.
    #[error("unrecognized statement format: {0}")]
    UnrecognizedFormat(String),
    /// The file parsed, but no row survived the noise filter.
    #[error("no transactions found in statement")]
    NoTransactions,
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Administrator privileges required: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Statement(#[from] StatementError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::InvalidPattern(a), Self::InvalidPattern(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Statement(a), Self::Statement(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
