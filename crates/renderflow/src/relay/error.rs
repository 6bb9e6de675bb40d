use thiserror::Error;

pub type RelayResult<T> = Result<T, RelayError>;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Missing table")]
    MissingTable,

    #[error("Missing values")]
    MissingValues,

    #[error("Missing values/where")]
    MissingValuesOrWhere,

    #[error("Missing where")]
    MissingWhere,

    #[error("Unknown action")]
    UnknownAction,

    #[error("Invalid values: {0}")]
    InvalidValues(String),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Table not allowed: {0}")]
    TableNotAllowed(String),

    #[error("{0}")]
    Database(#[from] sqlx::Error),
}

impl RelayError {
    /// True for problems with the request itself; false for store failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, RelayError::Database(_))
    }
}
