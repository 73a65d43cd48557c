use thiserror::Error;

use crate::errors::DatabaseError;

pub type Result<T> = std::result::Result<T, QuotationError>;

#[derive(Error, Debug)]
pub enum QuotationError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Database error: {0}")]
    DatabaseConnectionError(#[from] DatabaseError),

    #[error("Invalid quotation point: {0}")]
    InvalidPoint(String),

    #[error("No data available: {0}")]
    NoData(String),
}
