use thiserror::Error;

/// Core error type for Parquet write operations
///
/// None of these are retried by the writer. The format is single pass and
/// offset addressed, so any failure leaves the sink unusable.
#[derive(Error, Debug)]
pub enum ParquetError {
    /// A column's declared type has no encoder
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// The page codec failed
    #[error("Compression error: {0}")]
    Compression(String),

    /// The sink rejected bytes
    #[error("Sink write error: {0}")]
    SinkWrite(#[from] std::io::Error),

    /// API misuse, such as writing after the footer
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Schema-related errors
    #[error("Schema error: {0}")]
    Schema(String),

    /// Invalid argument errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Data validation errors
    #[error("Data validation error: {0}")]
    DataValidation(String),

    /// A page header or footer could not be serialized
    #[error("Thrift encoding error: {0}")]
    Thrift(#[from] thrift::Error),

    /// Internal errors that shouldn't happen
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Parquet operations
pub type Result<T> = std::result::Result<T, ParquetError>;

impl ParquetError {
    /// Create a new unsupported type error
    pub fn unsupported_type<S: Into<String>>(msg: S) -> Self {
        ParquetError::UnsupportedType(msg.into())
    }

    /// Create a new compression error
    pub fn compression<S: Into<String>>(msg: S) -> Self {
        ParquetError::Compression(msg.into())
    }

    /// Create a new invalid state error
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        ParquetError::InvalidState(msg.into())
    }

    /// Create a new schema error
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        ParquetError::Schema(msg.into())
    }

    /// Create a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        ParquetError::InvalidArgument(msg.into())
    }

    /// Create a new data validation error
    pub fn data_validation<S: Into<String>>(msg: S) -> Self {
        ParquetError::DataValidation(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        ParquetError::Internal(msg.into())
    }

    /// Whether the error was raised by the destination rather than the encoder
    pub fn is_sink_error(&self) -> bool {
        matches!(self, ParquetError::SinkWrite(_))
    }
}
