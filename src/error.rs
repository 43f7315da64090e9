//! Error types for expression construction and evaluation.

use thiserror::Error;

/// Result type alias using [`ExprError`].
pub type Result<T> = std::result::Result<T, ExprError>;

/// Error types for expression operations.
#[derive(Debug, Error)]
pub enum ExprError {
    // ==================== Construction Errors ====================
    /// A scalar function was requested without a return type.
    #[error("RetType cannot be nil for ScalarFunction")]
    InvalidReturnType,

    /// The function name is not registered.
    #[error("FUNCTION {name} does not exist")]
    FunctionNotFound { name: String },

    /// Wrong number of arguments for a builtin.
    #[error("Incorrect parameter count in the call to native function '{name}': expected {expected}, got {actual}")]
    IncorrectParameterCount {
        name: String,
        expected: String,
        actual: usize,
    },

    /// Type mismatch errors.
    #[error("Type error: expected {expected}, got {actual}")]
    TypeError { expected: String, actual: String },

    // ==================== Planning Errors ====================
    /// Column lookup failed while binding physical offsets.
    #[error("Can't find column {0} in schema")]
    ColumnNotFound(String),

    // ==================== Evaluation Errors ====================
    /// Division by zero in expression evaluation.
    #[error("Division by zero")]
    DivisionByZero,

    /// Integer overflow in arithmetic.
    #[error("{type_name} value is out of range in '{expr}'")]
    Overflow { type_name: String, expr: String },

    /// The builtin does not implement the requested evaluation category.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// General evaluation errors.
    #[error("Evaluation error: {0}")]
    EvaluationError(String),

    /// Errors raised by Arrow compute kernels during vectorized evaluation.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl ExprError {
    /// Builds the error returned when a builtin is asked for an evaluator it
    /// does not provide.
    #[must_use]
    pub fn unsupported_eval(func: &str, category: &str) -> Self {
        ExprError::Unsupported(format!("{func} does not support {category} evaluation"))
    }
}
