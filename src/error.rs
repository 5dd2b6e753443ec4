//! Error types for qfilter.

use thiserror::Error;

/// The main error type for qfilter operations.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Scalar type cannot be combined with the given key layout.
    #[error("Unsupported scalar: {0}")]
    UnsupportedScalar(String),

    /// `scalar` operation without a scalar spec.
    #[error("Missing scalar spec for table '{0}'")]
    MissingScalar(String),

    /// Insert or update with nothing to write.
    #[error("Empty payload for {exec} on table '{table}'")]
    EmptyPayload { exec: &'static str, table: String },

    /// `query` operation without a template.
    #[error("Missing query template for table '{0}'")]
    MissingQuery(String),

    /// Condition kind not recognized (strict mode only).
    #[error("Unknown condition kind: '{0}'")]
    UnknownCondition(String),

    /// Descriptor is malformed.
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// Inline binding cannot carry positional parameters.
    #[error("Inline binding cannot carry {0} positional parameter(s); escape them into the template")]
    InlineParams(usize),

    /// Database error reported by the execution adapter.
    #[error("Database error: {0}")]
    Database(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FilterError {
    /// Create an invalid descriptor error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidDescriptor(message.into())
    }

    /// Whether the error was raised while compiling, before any execution.
    pub fn is_compile(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedScalar(_)
                | Self::MissingScalar(_)
                | Self::EmptyPayload { .. }
                | Self::MissingQuery(_)
                | Self::UnknownCondition(_)
                | Self::InvalidDescriptor(_)
                | Self::InlineParams(_)
        )
    }
}

impl From<sqlx::Error> for FilterError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Connection(err.to_string())
            }
            sqlx::Error::Database(db) => Self::Database(db.to_string()),
            other => Self::Execution(other.to_string()),
        }
    }
}

/// Result type alias for qfilter operations.
pub type FilterResult<T> = Result<T, FilterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FilterError::EmptyPayload {
            exec: "update",
            table: "users".to_string(),
        };
        assert_eq!(err.to_string(), "Empty payload for update on table 'users'");
    }

    #[test]
    fn test_compile_classification() {
        assert!(FilterError::MissingQuery("t".into()).is_compile());
        assert!(FilterError::invalid("bad").is_compile());
        assert!(!FilterError::Database("ORA-00942".into()).is_compile());
    }
}
