use thiserror::Error;

/// Record set inconsistencies that would corrupt trace counts if aggregated
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// A generation points at a trace that is not in the record set
    #[error("generation {generation_id} references unknown trace {trace_id}")]
    UnknownTrace {
        generation_id: String,
        trace_id: String,
    },

    /// Two traces share an identifier
    #[error("duplicate trace id {0}")]
    DuplicateTrace(String),

    /// Two generations share an identifier
    #[error("duplicate generation id {0}")]
    DuplicateGeneration(String),
}

/// tracemeter error types
#[derive(Error, Debug)]
pub enum TracemeterError {
    /// Failed to parse an export file
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Query parameters out of range
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Record set failed validation
    #[error("data integrity error: {0}")]
    Integrity(#[from] IntegrityError),
}

/// Result type alias for tracemeter
pub type Result<T> = std::result::Result<T, TracemeterError>;
