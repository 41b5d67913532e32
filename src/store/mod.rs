//! Storage abstractions for passwordless tokens

pub mod memory;
pub mod models;
pub mod mongo;

pub use memory::InMemoryTokenStore;
pub use models::TokenRecord;
pub use mongo::MongoStore;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TokenStoreError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, TokenStoreError>;

/// Outcome of a token authentication attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The token matched a live record; `origin_url` is whatever was stored
    /// alongside it (possibly nothing)
    Match { origin_url: Option<String> },
    /// No live record for the uid, or the token did not match
    NoMatch,
}

impl AuthOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, AuthOutcome::Match { .. })
    }
}

/// Trait for one-time token storage
///
/// At most one live token per uid: storing a new token for a uid supersedes
/// and immediately invalidates any previous one. Tokens are hashed with a
/// fresh salt before storage and expire at an absolute instant; an expired
/// token never authenticates, whether or not the backend has physically
/// purged it yet.
///
/// Arguments are validated before any I/O is attempted: an empty `token` or
/// `uid`, or a zero `ttl`, yields [`TokenStoreError::InvalidArgument`]
/// without the backend having been touched. Absence of a record is never an
/// error: unknown or expired tokens authenticate as [`AuthOutcome::NoMatch`]
/// and removing a nonexistent uid succeeds.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store a token for `uid`, replacing any existing record for that uid.
    /// The token is valid until now + `ttl`.
    async fn store_or_update(
        &self,
        token: &str,
        uid: &str,
        ttl: Duration,
        origin_url: Option<&str>,
    ) -> StoreResult<()>;

    /// Check `token` against the live record for `uid`, if any. Read-only.
    async fn authenticate(&self, token: &str, uid: &str) -> StoreResult<AuthOutcome>;

    /// Delete the record for `uid` if present. Idempotent.
    async fn remove(&self, uid: &str) -> StoreResult<()>;

    /// Delete all records unconditionally
    async fn clear(&self) -> StoreResult<()>;

    /// Total number of stored records, expired-but-unpurged ones included
    async fn length(&self) -> StoreResult<u64>;
}

/// Validate the shared store/authenticate argument preconditions
pub(crate) fn require_nonempty(
    value: &str,
    what: &'static str,
) -> Result<(), TokenStoreError> {
    if value.is_empty() {
        return Err(TokenStoreError::InvalidArgument(what));
    }
    Ok(())
}

/// Validate the token lifetime precondition shared by all backends,
/// before any hashing or I/O is performed
pub(crate) fn require_nonzero_ttl(ttl: Duration) -> Result<(), TokenStoreError> {
    if ttl.is_zero() {
        return Err(TokenStoreError::InvalidArgument("ttl must be non-zero"));
    }
    Ok(())
}
