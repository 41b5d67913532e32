//! Token hashing primitives
//!
//! Tokens are hashed with bcrypt before they ever reach the store; the salt
//! is generated fresh per call and embedded in the output, so two hashes of
//! the same plaintext never compare equal. Hashing is CPU-bound and runs on
//! the blocking pool to keep the async executor free.

use crate::error::TokenStoreError;

/// Default bcrypt cost factor
pub const BCRYPT_COST: u32 = 12;

/// Hash a token with bcrypt and a fresh random salt
pub async fn hash_token(token: &str) -> Result<String, TokenStoreError> {
    let token = token.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(token, BCRYPT_COST))
        .await
        .map_err(|e| TokenStoreError::Operation(e.to_string()))?
        .map_err(TokenStoreError::from)
}

/// Verify a plaintext token against a stored bcrypt hash
pub async fn verify_token(token: &str, hash: &str) -> Result<bool, TokenStoreError> {
    let token = token.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(token, &hash))
        .await
        .map_err(|e| TokenStoreError::Operation(e.to_string()))?
        .map_err(TokenStoreError::from)
}
