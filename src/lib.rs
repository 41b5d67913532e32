//! MongoDB-backed token store for passwordless authentication
//!
//! Stores one-time login tokens (bcrypt-hashed, never in plaintext) keyed by
//! a user identifier, with absolute expiry timestamps enforced both at read
//! time and by a MongoDB TTL index. One live token per uid; storing a new
//! token atomically supersedes the previous one.

pub mod config;
pub mod crypto;
pub mod error;
pub mod store;

pub use config::{MongoStoreConfig, DEFAULT_COLLECTION_NAME};
pub use error::TokenStoreError;
pub use store::{AuthOutcome, InMemoryTokenStore, MongoStore, StoreResult, TokenStore};
