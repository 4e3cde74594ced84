//! Integration tests for the session engine over the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use stowage_session::codec::JsonCodec;
use stowage_session::id::{self, HashedIdGenerator};
use stowage_session::{
    MemorySessionStore, SessionConfig, SessionError, SessionFactory, SessionStore,
};

fn factory_over(store: Arc<MemorySessionStore>, timeout: u64) -> SessionFactory {
    SessionFactory::new(store, SessionConfig::new().with_timeout(timeout)).unwrap()
}

#[tokio::test]
async fn test_concurrent_allocation_is_unique() {
    const N: usize = 32;
    let store = Arc::new(MemorySessionStore::new());

    let mut handles = Vec::new();
    for _ in 0..N {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let (id, _) = id::allocate(&*store, &JsonCodec, 60, &HashedIdGenerator)
                .await
                .unwrap();
            id
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }

    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), N, "every allocation claimed a distinct id");
    assert_eq!(store.len().await, N);
}

#[tokio::test]
async fn test_round_trip_through_backing_store() {
    let store = Arc::new(MemorySessionStore::new());
    let factory = factory_over(store.clone(), 60);

    let mut session = factory.session(None).await.unwrap();
    session.insert("answer", json!({"n": 42})).await.unwrap();
    assert_eq!(
        session.get::<serde_json::Value>("answer").await.unwrap(),
        Some(json!({"n": 42}))
    );

    // Reload the record from the backing store through a second session
    let session_id = session.id().await.unwrap();
    let mut reloaded = factory.session(Some(&session_id)).await.unwrap();
    assert!(!reloaded.is_new().await.unwrap());
    assert_eq!(
        reloaded.get::<serde_json::Value>("answer").await.unwrap(),
        Some(json!({"n": 42}))
    );
}

#[tokio::test(start_paused = true)]
async fn test_reads_and_writes_reset_ttl() {
    let store = Arc::new(MemorySessionStore::new());
    let factory = factory_over(store.clone(), 100);

    let mut session = factory.session(None).await.unwrap();
    let session_id = session.id().await.unwrap();

    tokio::time::advance(Duration::from_secs(40)).await;
    assert!(store.ttl(&session_id).await.unwrap().unwrap() <= Duration::from_secs(60));

    // A read resets the window to the full timeout, not merely keeps it
    let _: Option<i64> = session.get("missing").await.unwrap();
    assert_eq!(
        store.ttl(&session_id).await.unwrap().unwrap(),
        Duration::from_secs(100)
    );

    tokio::time::advance(Duration::from_secs(40)).await;

    // So does a write
    session.insert("k", 1).await.unwrap();
    assert_eq!(
        store.ttl(&session_id).await.unwrap().unwrap(),
        Duration::from_secs(100)
    );
}

#[tokio::test]
async fn test_invalidate_then_access_recreates() {
    let store = Arc::new(MemorySessionStore::new());
    let factory = factory_over(store.clone(), 60);

    let mut session = factory.session(None).await.unwrap();
    session.insert("user", "alice").await.unwrap();
    let old_id = session.id().await.unwrap();

    session.invalidate().await.unwrap();
    assert!(session.is_detached());
    assert!(!store.exists(&old_id).await.unwrap());

    // Next access allocates a fresh identity with an empty payload
    let new_id = session.id().await.unwrap();
    assert_ne!(new_id, old_id);
    assert!(session.is_new().await.unwrap());
    assert!(session.is_empty().await.unwrap());
    assert!(store.exists(&new_id).await.unwrap());
}

#[tokio::test]
async fn test_double_invalidate_is_idempotent() {
    let store = Arc::new(MemorySessionStore::new());
    let factory = factory_over(store.clone(), 60);

    let mut session = factory.session(None).await.unwrap();
    session.invalidate().await.unwrap();
    session.invalidate().await.unwrap();

    // No replacement was allocated by the second invalidate
    assert!(session.is_detached());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_expired_candidate_falls_back_to_fresh_session() {
    let store = Arc::new(MemorySessionStore::new());
    let factory = factory_over(store.clone(), 60);

    let mut session = factory
        .session(Some("deadbeef-no-such-record"))
        .await
        .unwrap();
    assert!(session.is_new().await.unwrap());
    assert_ne!(session.id().await.unwrap(), "deadbeef-no-such-record");
}

#[tokio::test]
async fn test_missing_key_reads() {
    let store = Arc::new(MemorySessionStore::new());
    let factory = factory_over(store, 60);
    let mut session = factory.session(None).await.unwrap();

    let err = session.require::<String>("missing").await.unwrap_err();
    assert!(matches!(err, SessionError::NotFound(_)));

    let err = session.pop::<String>("missing").await.unwrap_err();
    assert!(matches!(err, SessionError::NotFound(_)));

    assert_eq!(session.get::<String>("missing").await.unwrap(), None);
    assert_eq!(
        session.pop_or("missing", "fallback".to_string()).await.unwrap(),
        "fallback"
    );
}

#[tokio::test]
async fn test_set_default_does_not_overwrite() {
    let store = Arc::new(MemorySessionStore::new());
    let factory = factory_over(store, 60);
    let mut session = factory.session(None).await.unwrap();

    assert_eq!(session.set_default("n", 1).await.unwrap(), 1);
    assert_eq!(session.set_default("n", 2).await.unwrap(), 1);
    assert_eq!(session.get::<i64>("n").await.unwrap(), Some(1));
}

#[tokio::test]
async fn test_dict_surface() {
    let store = Arc::new(MemorySessionStore::new());
    let factory = factory_over(store, 60);
    let mut session = factory.session(None).await.unwrap();

    session
        .update([
            ("a".to_string(), json!(1)),
            ("b".to_string(), json!("two")),
        ])
        .await
        .unwrap();

    assert!(session.contains("a").await.unwrap());
    assert_eq!(session.len().await.unwrap(), 2);

    let mut keys = session.keys().await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

    let entries = session.entries().await.unwrap();
    assert_eq!(entries.len(), 2);

    let (key, _) = session.pop_item().await.unwrap();
    assert!(!session.contains(&key).await.unwrap());

    session.clear().await.unwrap();
    assert!(session.is_empty().await.unwrap());

    let err = session.pop_item().await.unwrap_err();
    assert!(matches!(err, SessionError::NotFound(_)));
}

#[tokio::test]
async fn test_remove_requires_presence() {
    let store = Arc::new(MemorySessionStore::new());
    let factory = factory_over(store, 60);
    let mut session = factory.session(None).await.unwrap();

    session.insert("k", 1).await.unwrap();
    session.remove("k").await.unwrap();
    let err = session.remove("k").await.unwrap_err();
    assert!(matches!(err, SessionError::NotFound(_)));
}

#[tokio::test(start_paused = true)]
async fn test_adjust_timeout_changes_refresh_window() {
    let store = Arc::new(MemorySessionStore::new());
    let factory = factory_over(store.clone(), 100);

    let mut session = factory.session(None).await.unwrap();
    let session_id = session.id().await.unwrap();

    session.adjust_timeout(500).await.unwrap();
    assert_eq!(
        store.ttl(&session_id).await.unwrap().unwrap(),
        Duration::from_secs(500)
    );

    // The adjusted window survives later refreshes
    tokio::time::advance(Duration::from_secs(10)).await;
    let _ = session.contains("x").await.unwrap();
    assert_eq!(
        store.ttl(&session_id).await.unwrap().unwrap(),
        Duration::from_secs(500)
    );

    // And the adjusted timeout is what a reload sees
    let mut reloaded = factory.session(Some(&session_id)).await.unwrap();
    assert_eq!(reloaded.timeout().await.unwrap(), 500);
}

#[tokio::test]
async fn test_csrf_token_is_idempotent() {
    let store = Arc::new(MemorySessionStore::new());
    let factory = factory_over(store, 60);
    let mut session = factory.session(None).await.unwrap();

    let first = session.get_csrf_token().await.unwrap();
    let second = session.get_csrf_token().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 40);

    let rotated = session.new_csrf_token().await.unwrap();
    assert_ne!(rotated, first);
    assert_eq!(session.get_csrf_token().await.unwrap(), rotated);
}

#[tokio::test]
async fn test_flash_queue_semantics() {
    let store = Arc::new(MemorySessionStore::new());
    let factory = factory_over(store, 60);
    let mut session = factory.session(None).await.unwrap();

    session.flash("x", "", true).await.unwrap();
    assert_eq!(session.peek_flash("").await.unwrap(), vec![json!("x")]);
    assert_eq!(session.pop_flash("").await.unwrap(), vec![json!("x")]);
    assert_eq!(session.pop_flash("").await.unwrap(), Vec::<serde_json::Value>::new());

    session.flash("x", "", false).await.unwrap();
    session.flash("x", "", false).await.unwrap();
    assert_eq!(session.pop_flash("").await.unwrap(), vec![json!("x")]);
}

#[tokio::test]
async fn test_flash_queues_are_independent() {
    let store = Arc::new(MemorySessionStore::new());
    let factory = factory_over(store, 60);
    let mut session = factory.session(None).await.unwrap();

    session.flash("a", "", true).await.unwrap();
    session.flash("b", "errors", true).await.unwrap();

    assert_eq!(session.pop_flash("errors").await.unwrap(), vec![json!("b")]);
    assert_eq!(session.peek_flash("").await.unwrap(), vec![json!("a")]);
}

#[tokio::test]
async fn test_flash_survives_reload() {
    let store = Arc::new(MemorySessionStore::new());
    let factory = factory_over(store, 60);

    let mut session = factory.session(None).await.unwrap();
    session.flash("saved", "", true).await.unwrap();
    let session_id = session.id().await.unwrap();

    let mut reloaded = factory.session(Some(&session_id)).await.unwrap();
    assert_eq!(reloaded.pop_flash("").await.unwrap(), vec![json!("saved")]);
}

#[tokio::test]
async fn test_prefixed_keys_allocate_under_prefix() {
    let store = Arc::new(MemorySessionStore::new());
    let factory = SessionFactory::new(
        store.clone(),
        SessionConfig::new().with_timeout(60).with_key_prefix("session:"),
    )
    .unwrap();

    let mut session = factory.session(None).await.unwrap();
    let session_id = session.id().await.unwrap();
    assert!(session_id.starts_with("session:"));
    assert!(store.exists(&session_id).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_session_expires_after_inactivity() {
    let store = Arc::new(MemorySessionStore::new());
    let factory = factory_over(store.clone(), 30);

    let mut session = factory.session(None).await.unwrap();
    session.insert("k", 1).await.unwrap();
    let session_id = session.id().await.unwrap();

    tokio::time::advance(Duration::from_secs(31)).await;

    // The record is gone; presenting the old id yields a fresh session
    let mut later = factory.session(Some(&session_id)).await.unwrap();
    assert!(later.is_new().await.unwrap());
    assert_ne!(later.id().await.unwrap(), session_id);
}
