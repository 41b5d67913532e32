//! Token store error types

use mongodb::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// A required argument was missing or malformed. Returned before any
    /// asynchronous work is attempted.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Failed to establish or use the underlying store connection.
    #[error("Store connection failed: {0}")]
    Connectivity(String),

    /// The underlying store rejected a read or write. Not interpreted and
    /// not retried; retry policy belongs to the caller.
    #[error("Store operation failed: {0}")]
    Operation(String),
}

impl TokenStoreError {
    /// Classify a driver error: connection-class failures become
    /// `Connectivity` (callers may invalidate a cached handle on those),
    /// everything else is an opaque `Operation` failure.
    pub(crate) fn classify(err: mongodb::error::Error) -> Self {
        if is_connection_error(&err) {
            TokenStoreError::Connectivity(err.to_string())
        } else {
            TokenStoreError::Operation(err.to_string())
        }
    }

    pub(crate) fn is_connectivity(&self) -> bool {
        matches!(self, TokenStoreError::Connectivity(_))
    }
}

fn is_connection_error(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } | ErrorKind::ConnectionPoolCleared { .. }
    )
}

impl From<bcrypt::BcryptError> for TokenStoreError {
    fn from(err: bcrypt::BcryptError) -> Self {
        TokenStoreError::Operation(err.to_string())
    }
}
