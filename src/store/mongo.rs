//! MongoDB-backed token store implementation

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bson::doc;
use chrono::Utc;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use tokio::sync::Mutex;

use super::{
    require_nonempty, require_nonzero_ttl, AuthOutcome, StoreResult, TokenRecord, TokenStore,
};
use crate::config::{MongoStoreConfig, DEFAULT_DATABASE_NAME};
use crate::crypto;
use crate::error::TokenStoreError;

/// MongoDB-backed store implementing [`TokenStore`]
///
/// Holds no token state in memory; every operation round-trips to the
/// server, which arbitrates consistency through an atomic upsert and a
/// unique index on `uid`. The connection is established lazily on first
/// use and cached for the lifetime of the instance.
pub struct MongoStore {
    uri: String,
    config: MongoStoreConfig,
    // Guarded lazy-init cell. Concurrent first callers serialize on this
    // lock, so at most one client is opened per instance; cleared when an
    // operation observes a dead connection on the cached handle.
    collection: Mutex<Option<CachedCollection>>,
    generation: AtomicU64,
}

/// Cached handle plus the generation it was bootstrapped under, so a
/// failing operation only invalidates the handle it was actually using
/// and never one a concurrent task reconnected in the meantime.
#[derive(Clone)]
struct CachedCollection {
    generation: u64,
    collection: Collection<TokenRecord>,
}

impl MongoStore {
    /// Create a store for the given connection URI with default options.
    /// No connection is attempted until the first operation.
    pub fn new(uri: impl Into<String>) -> StoreResult<Self> {
        Self::with_config(uri, MongoStoreConfig::default())
    }

    /// Create a store with explicit configuration
    pub fn with_config(uri: impl Into<String>, config: MongoStoreConfig) -> StoreResult<Self> {
        let uri = uri.into();
        if uri.trim().is_empty() {
            return Err(TokenStoreError::InvalidArgument(
                "a connection URI has to be provided",
            ));
        }
        if config.collection_name.is_empty() {
            return Err(TokenStoreError::InvalidArgument(
                "collection name must not be empty",
            ));
        }

        Ok(Self {
            uri,
            config,
            collection: Mutex::new(None),
            generation: AtomicU64::new(0),
        })
    }

    /// Get the working collection, connecting and bootstrapping indexes on
    /// first use
    async fn collection(&self) -> StoreResult<CachedCollection> {
        let mut cached = self.collection.lock().await;
        if let Some(cached) = cached.as_ref() {
            return Ok(cached.clone());
        }

        let options = match self.config.client_options.clone() {
            Some(options) => options,
            None => ClientOptions::parse(&self.uri)
                .await
                .map_err(|e| TokenStoreError::Connectivity(e.to_string()))?,
        };
        let client =
            Client::with_options(options).map_err(|e| TokenStoreError::Connectivity(e.to_string()))?;

        let database = match &self.config.database_name {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE_NAME)),
        };
        let collection = database.collection::<TokenRecord>(&self.config.collection_name);

        Self::ensure_indexes(&collection).await?;

        tracing::info!(
            database = %database.name(),
            collection = %self.config.collection_name,
            "Connected to token store"
        );

        let entry = CachedCollection {
            generation: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
            collection,
        };
        *cached = Some(entry.clone());
        Ok(entry)
    }

    /// Idempotently ensure the structural invariants: a unique index on
    /// `uid` and a TTL index on `ttl` so the server purges expired records
    /// itself. Failure here fails the whole bootstrap; the handle is not
    /// cached, so the next operation retries from scratch.
    async fn ensure_indexes(collection: &Collection<TokenRecord>) -> StoreResult<()> {
        let unique_uid = IndexModel::builder()
            .keys(doc! { "uid": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection
            .create_index(unique_uid)
            .await
            .map_err(|e| TokenStoreError::Connectivity(format!("error creating index: {}", e)))?;

        let expire_ttl = IndexModel::builder()
            .keys(doc! { "ttl": 1 })
            .options(
                IndexOptions::builder()
                    .expire_after(Duration::from_secs(0))
                    .build(),
            )
            .build();
        collection
            .create_index(expire_ttl)
            .await
            .map_err(|e| TokenStoreError::Connectivity(format!("error creating index: {}", e)))?;

        tracing::debug!("Ensured unique uid index and ttl expiry index");
        Ok(())
    }

    /// Map a per-operation driver error; a connection-class failure also
    /// invalidates the cached handle so the next operation reconnects
    /// instead of reusing a dead connection. Only the generation the
    /// failing operation was using is dropped; a handle reconnected by a
    /// concurrent task stays cached.
    async fn operation_failed(
        &self,
        generation: u64,
        err: mongodb::error::Error,
    ) -> TokenStoreError {
        let err = TokenStoreError::classify(err);
        if err.is_connectivity() {
            let mut cached = self.collection.lock().await;
            if cached.as_ref().is_some_and(|c| c.generation == generation) {
                cached.take();
                tracing::warn!(error = %err, "Dropped cached connection after connectivity failure");
            }
        }
        err
    }
}

#[async_trait]
impl TokenStore for MongoStore {
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

        let cached = self.collection().await?;
        match cached
            .collection
            .replace_one(doc! { "uid": uid }, &record)
            .upsert(true)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => Err(self.operation_failed(cached.generation, err).await),
        }
    }

    async fn authenticate(&self, token: &str, uid: &str) -> StoreResult<AuthOutcome> {
        require_nonempty(token, "token must not be empty")?;
        require_nonempty(uid, "uid must not be empty")?;

        let cached = self.collection().await?;

        // The ttl filter is applied server-side; store-side TTL cleanup is
        // best-effort background work and cannot be relied on at read time.
        let filter = doc! {
            "uid": uid,
            "ttl": { "$gt": bson::DateTime::from_chrono(Utc::now()) },
        };
        let record = match cached.collection.find_one(filter).await {
            Ok(record) => record,
            Err(err) => return Err(self.operation_failed(cached.generation, err).await),
        };

        match record {
            Some(record) => {
                if crypto::verify_token(token, &record.hashed_token).await? {
                    Ok(AuthOutcome::Match {
                        origin_url: record.origin_url,
                    })
                } else {
                    Ok(AuthOutcome::NoMatch)
                }
            }
            None => Ok(AuthOutcome::NoMatch),
        }
    }

    async fn remove(&self, uid: &str) -> StoreResult<()> {
        require_nonempty(uid, "uid must not be empty")?;

        let cached = self.collection().await?;
        match cached.collection.delete_one(doc! { "uid": uid }).await {
            // Deleting a nonexistent uid is success
            Ok(_) => Ok(()),
            Err(err) => Err(self.operation_failed(cached.generation, err).await),
        }
    }

    async fn clear(&self) -> StoreResult<()> {
        let cached = self.collection().await?;
        match cached.collection.delete_many(doc! {}).await {
            Ok(_) => Ok(()),
            Err(err) => Err(self.operation_failed(cached.generation, err).await),
        }
    }

    async fn length(&self) -> StoreResult<u64> {
        let cached = self.collection().await?;
        match cached.collection.count_documents(doc! {}).await {
            Ok(count) => Ok(count),
            Err(err) => Err(self.operation_failed(cached.generation, err).await),
        }
    }
}
