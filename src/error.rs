//! Error types for colexec operators.

use arrow::error::ArrowError;
use datafusion::error::DataFusionError;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Error types raised while preparing or driving operators.
#[derive(Debug, Error)]
pub enum Error {
    /// Type mismatch errors.
    #[error("Type error: expected {expected}, got {actual}")]
    TypeError { expected: String, actual: String },

    /// General execution errors.
    #[error("Execution error: {0}")]
    ExecutionError(String),

    // ==================== Memory Errors ====================
    /// The memory pool refused a reservation.
    #[error("Allocation error: {0}")]
    AllocationError(String),

    /// Misuse of a vector (writing into a constant, reading out of range, ...).
    #[error("Invalid vector operation: {0}")]
    InvalidVector(String),

    // ==================== Evaluation Errors ====================
    /// Invalid expression during query execution.
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    /// Rowset descriptor violates the fill invariant.
    #[error("Invalid rowset: {0}")]
    InvalidRowset(String),

    /// Unsupported operation in the current context.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Division by zero in expression evaluation.
    #[error("Division by zero")]
    DivisionByZero,

    /// Error raised by an Arrow compute kernel.
    #[error("Arrow error: {0}")]
    Arrow(ArrowError),

    // ==================== Operator Errors ====================
    /// Operator driven out of its lifecycle order.
    #[error("Operator state error: {0}")]
    OperatorState(String),

    /// Query was canceled by the session.
    #[error("Query canceled")]
    Canceled,

    /// Query timeout exceeded.
    #[error("Query timeout: execution exceeded {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },
}

impl From<ArrowError> for Error {
    fn from(err: ArrowError) -> Self {
        match err {
            ArrowError::DivideByZero => Error::DivisionByZero,
            ArrowError::MemoryError(msg) => Error::AllocationError(msg),
            other => Error::Arrow(other),
        }
    }
}

impl From<DataFusionError> for Error {
    fn from(err: DataFusionError) -> Self {
        match err {
            DataFusionError::ResourcesExhausted(msg) => Error::AllocationError(msg),
            DataFusionError::ArrowError(e, _) => Error::from(e),
            other => Error::ExecutionError(other.to_string()),
        }
    }
}
