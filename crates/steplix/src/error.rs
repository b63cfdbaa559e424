//! Error types for steplix

use thiserror::Error;

/// Result type alias for steplix operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Errors raised while configuring, connecting to and querying the database.
///
/// The SQL compiler is total and never produces one of these.
#[derive(Debug, Error)]
pub enum OrmError {
    #[error("Connection error: {0}")]
    Connection(String),

    /// Any database error without a more specific variant.
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    /// SQLSTATE 23505.
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// SQLSTATE 23503.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// SQLSTATE 23514.
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// A column could not be read into the requested Rust type.
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    #[error("{0}")]
    Other(String),
}

impl OrmError {
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Error returned once a [`Database`](crate::Database) has been ended.
    pub fn closed() -> Self {
        Self::Connection("database connection is closed".to_string())
    }

    /// Map a driver error, giving constraint violations their own variants.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        let Some(db_err) = err.as_db_error() else {
            return Self::Query(err);
        };
        let detail = format!(
            "{}: {}",
            db_err.constraint().unwrap_or("unknown"),
            db_err.message()
        );

        match db_err.code().code() {
            "23505" => Self::UniqueViolation(detail),
            "23503" => Self::ForeignKeyViolation(detail),
            "23514" => Self::CheckViolation(detail),
            _ => Self::Query(err),
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
