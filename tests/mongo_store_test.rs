//! Integration tests against a live MongoDB.
//!
//! Ignored by default; run with a local server via
//! `MONGODB_URI=mongodb://localhost:27017/passwordless-test cargo test -- --ignored`.

use std::time::Duration;

use mongodb::Client;
use passwordless_mongostore::{
    AuthOutcome, MongoStore, MongoStoreConfig, TokenStore, DEFAULT_COLLECTION_NAME,
};
use uuid::Uuid;

const MINUTE: Duration = Duration::from_secs(60);

fn test_uri() -> String {
    std::env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017/passwordless-test".to_string())
}

/// Store bound to its own collection so tests don't interfere
fn test_store(collection_name: &str) -> MongoStore {
    let config = MongoStoreConfig {
        collection_name: collection_name.to_string(),
        ..Default::default()
    };
    MongoStore::with_config(test_uri(), config).unwrap()
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn test_end_to_end_flow() {
    let store = test_store("tokens-e2e");
    store.clear().await.unwrap();

    store
        .store_or_update("abc", "alice@example.com", MINUTE, Some("http://x/y"))
        .await
        .unwrap();

    let outcome = store.authenticate("abc", "alice@example.com").await.unwrap();
    assert_eq!(
        outcome,
        AuthOutcome::Match {
            origin_url: Some("http://x/y".to_string())
        }
    );

    store.clear().await.unwrap();
    assert_eq!(store.length().await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn test_update_supersedes_and_keeps_one_record() {
    let store = test_store("tokens-supersede");
    store.clear().await.unwrap();

    let (first, second) = (Uuid::new_v4().to_string(), Uuid::new_v4().to_string());

    store
        .store_or_update(&first, "alice@example.com", MINUTE, Some("http://first/"))
        .await
        .unwrap();
    store
        .store_or_update(&second, "alice@example.com", MINUTE, Some("http://second/"))
        .await
        .unwrap();

    assert_eq!(store.length().await.unwrap(), 1);
    assert_eq!(
        store.authenticate(&first, "alice@example.com").await.unwrap(),
        AuthOutcome::NoMatch
    );
    assert_eq!(
        store.authenticate(&second, "alice@example.com").await.unwrap(),
        AuthOutcome::Match {
            origin_url: Some("http://second/".to_string())
        }
    );
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn test_expired_token_is_filtered_server_side() {
    let store = test_store("tokens-expiry");
    store.clear().await.unwrap();

    let token = Uuid::new_v4().to_string();
    store
        .store_or_update(&token, "alice@example.com", Duration::from_millis(100), None)
        .await
        .unwrap();

    assert!(store
        .authenticate(&token, "alice@example.com")
        .await
        .unwrap()
        .is_match());

    tokio::time::sleep(Duration::from_millis(200)).await;

    // The read filters on ttl itself; it does not wait for the server's
    // background purge
    assert_eq!(
        store.authenticate(&token, "alice@example.com").await.unwrap(),
        AuthOutcome::NoMatch
    );
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn test_remove_is_idempotent() {
    let store = test_store("tokens-remove");
    store.clear().await.unwrap();

    store.remove("nobody@example.com").await.unwrap();

    store
        .store_or_update("token", "alice@example.com", MINUTE, None)
        .await
        .unwrap();
    store.remove("alice@example.com").await.unwrap();
    store.remove("alice@example.com").await.unwrap();

    assert_eq!(store.length().await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn test_length_counts_distinct_uids() {
    let store = test_store("tokens-length");
    store.clear().await.unwrap();
    assert_eq!(store.length().await.unwrap(), 0);

    for i in 0..2 {
        store
            .store_or_update(
                &Uuid::new_v4().to_string(),
                &format!("user{}@example.com", i),
                MINUTE,
                None,
            )
            .await
            .unwrap();
    }
    assert_eq!(store.length().await.unwrap(), 2);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn test_default_collection_is_created_on_first_store() {
    let store = MongoStore::new(test_uri()).unwrap();
    store
        .store_or_update(
            &Uuid::new_v4().to_string(),
            "alice@example.com",
            MINUTE,
            None,
        )
        .await
        .unwrap();

    let client = Client::with_uri_str(test_uri()).await.unwrap();
    let db = client.default_database().unwrap();
    let names = db.list_collection_names().await.unwrap();
    assert!(names.contains(&DEFAULT_COLLECTION_NAME.to_string()));
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn test_indexes_are_bootstrapped() {
    let store = test_store("tokens-indexes");
    store.clear().await.unwrap();

    let client = Client::with_uri_str(test_uri()).await.unwrap();
    let collection = client
        .default_database()
        .unwrap()
        .collection::<mongodb::bson::Document>("tokens-indexes");

    let indexes: Vec<_> = {
        use futures_util::TryStreamExt;
        collection.list_indexes().await.unwrap().try_collect().await.unwrap()
    };

    let unique_uid = indexes.iter().any(|idx| {
        idx.keys.contains_key("uid") && idx.options.as_ref().is_some_and(|o| o.unique == Some(true))
    });
    let ttl_expiry = indexes.iter().any(|idx| {
        idx.keys.contains_key("ttl")
            && idx
                .options
                .as_ref()
                .is_some_and(|o| o.expire_after == Some(Duration::from_secs(0)))
    });
    assert!(unique_uid, "unique index on uid missing");
    assert!(ttl_expiry, "ttl expiry index missing");
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn test_concurrent_first_use_opens_single_connection() {
    let store = std::sync::Arc::new(test_store("tokens-concurrent"));
    store.clear().await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .store_or_update(
                    &Uuid::new_v4().to_string(),
                    &format!("user{}@example.com", i),
                    MINUTE,
                    None,
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.length().await.unwrap(), 8);
}
