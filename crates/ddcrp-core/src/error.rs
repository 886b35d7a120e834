//! Error types for ddCRP clustering operations.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DdcrpError>;

/// Errors that can occur during ddCRP clustering operations.
#[derive(Debug, Error)]
pub enum DdcrpError {
    /// Invalid parameter provided.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of what's wrong with the parameter
        message: String,
    },

    /// A customer index outside the current customer arena was supplied.
    #[error("Customer index {index} out of range: {count} customers ingested")]
    CustomerOutOfRange {
        /// Index supplied by the caller
        index: usize,
        /// Number of customers currently ingested
        count: usize,
    },
}

impl DdcrpError {
    /// Create an InvalidParameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a CustomerOutOfRange error.
    pub fn customer_out_of_range(index: usize, count: usize) -> Self {
        Self::CustomerOutOfRange { index, count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = DdcrpError::invalid_parameter("alpha must be > 0");
        assert!(err.to_string().contains("alpha must be > 0"));

        let err = DdcrpError::customer_out_of_range(7, 3);
        let msg = err.to_string();
        assert!(msg.contains('7'), "message should name the index: {msg}");
        assert!(msg.contains('3'), "message should name the count: {msg}");
    }
}
