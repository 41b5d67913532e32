//! In-memory token store implementation
//!
//! Honors the same contract as the MongoDB backend, including the
//! independent expiry check at read time. Useful for tests and for hosts
//! that do not need durability.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::{
    require_nonempty, require_nonzero_ttl, AuthOutcome, StoreResult, TokenRecord, TokenStore,
};
use crate::crypto;

/// In-memory token store keyed by uid
pub struct InMemoryTokenStore {
    records: RwLock<HashMap<String, TokenRecord>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn store_or_update(
        &self,
        token: &str,
        uid: &str,
        ttl: Duration,
        origin_url: Option<&str>,
    ) -> StoreResult<()> {
        require_nonempty(token, "token must not be empty")?;
        require_nonempty(uid, "uid must not be empty")?;
        require_nonzero_ttl(ttl)?;

        let hashed_token = crypto::hash_token(token).await?;
        let record = TokenRecord::new(uid, hashed_token, ttl, origin_url)?;

        // Full replace-or-insert; any previous token for this uid is
        // superseded immediately
        self.records
            .write()
            .unwrap()
            .insert(uid.to_string(), record);
        Ok(())
    }

    async fn authenticate(&self, token: &str, uid: &str) -> StoreResult<AuthOutcome> {
        require_nonempty(token, "token must not be empty")?;
        require_nonempty(uid, "uid must not be empty")?;

        let record = {
            let records = self.records.read().unwrap();
            records.get(uid).cloned()
        };

        let record = match record {
            Some(record) if record.is_live(Utc::now()) => record,
            _ => return Ok(AuthOutcome::NoMatch),
        };

        if crypto::verify_token(token, &record.hashed_token).await? {
            Ok(AuthOutcome::Match {
                origin_url: record.origin_url,
            })
        } else {
            Ok(AuthOutcome::NoMatch)
        }
    }

    async fn remove(&self, uid: &str) -> StoreResult<()> {
        require_nonempty(uid, "uid must not be empty")?;

        self.records.write().unwrap().remove(uid);
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.records.write().unwrap().clear();
        Ok(())
    }

    async fn length(&self) -> StoreResult<u64> {
        // Expired-but-unpurged records still count
        Ok(self.records.read().unwrap().len() as u64)
    }
}
