//! Token record data model

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TokenStoreError;

/// One stored token: a single document per uid
///
/// Field names serialize in camelCase for interoperability with collections
/// written by other implementations of the same store contract. `ttl`
/// serializes as a BSON Date so the server-side TTL monitor can act on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// Unique identifier of the principal the token authenticates
    pub uid: String,

    /// bcrypt hash of the plaintext token; the plaintext is never stored
    pub hashed_token: String,

    /// Absolute expiry instant; the record is dead once this has passed,
    /// whether or not the backend has purged it
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub ttl: DateTime<Utc>,

    /// Caller-supplied context returned verbatim on successful
    /// authentication; absent is a valid state
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub origin_url: Option<String>,
}

impl TokenRecord {
    /// Build a record expiring `ttl` from now. The zero-ttl precondition
    /// is enforced by the store operations; this only rejects durations
    /// beyond the representable range.
    pub fn new(
        uid: &str,
        hashed_token: String,
        ttl: Duration,
        origin_url: Option<&str>,
    ) -> Result<Self, TokenStoreError> {
        let lifetime = chrono::Duration::from_std(ttl)
            .map_err(|_| TokenStoreError::InvalidArgument("ttl out of range"))?;

        Ok(Self {
            uid: uid.to_string(),
            hashed_token,
            ttl: Utc::now() + lifetime,
            origin_url: origin_url.map(str::to_string),
        })
    }

    /// Whether the record is still live at `now`
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.ttl > now
    }
}
