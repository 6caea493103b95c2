//! Error types for foundation

use thiserror::Error;

/// Result type alias for foundation operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for query building and model operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Boolean operator outside AND/OR/XOR/NOT
    #[error("Invalid value for boolean operator: '{0}'")]
    InvalidOperator(String),

    /// Argument of the wrong shape (assertion type, join tuple, limit, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Positional access to a WHERE condition that does not exist
    #[error("Index out of bounds: {index} (len {len})")]
    OutOfBounds { index: usize, len: usize },

    /// The model has no primary key but the operation needs one
    #[error("Model '{0}' has no defined primary key")]
    MissingPrimaryKey(String),

    /// A new instance with a caller-assigned primary key has no value for it
    #[error("Cannot save a new instance of '{model}' without a value for {pk}")]
    MissingPrimaryKeyValue { model: String, pk: String },

    /// Mutation attempted on a read-only model
    #[error("Cannot execute modification because '{0}' is read-only")]
    ReadOnly(String),

    /// `Query::run` without a bound model
    #[error("Can't run a Query object without a model context")]
    UnboundQuery,

    /// Bound model name is not registered
    #[error("Unknown model: '{0}'")]
    UnknownModel(String),

    /// Field outside the model's declared field set
    #[error("Unknown field '{field}' for model '{model}'")]
    UnknownField { model: String, field: String },

    /// Instance handed to a model it does not belong to
    #[error("Object must be an instance of '{expected}' (was '{actual}')")]
    WrongModel { expected: String, actual: String },

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Datastore driver error
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration loading error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A query hook refused to run the statement
    #[error("Query aborted: {0}")]
    Aborted(String),
}

impl OrmError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an unknown field error
    pub fn unknown_field(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            model: model.into(),
            field: field.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a read-only violation
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly(_))
    }

    /// Check if this is an unknown field error
    pub fn is_unknown_field(&self) -> bool {
        matches!(self, Self::UnknownField { .. })
    }

    /// Check if this error came from the datastore driver
    pub fn is_database(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for OrmError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<toml::de::Error> for OrmError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
