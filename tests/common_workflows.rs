//! Integration tests for common stowage workflows.
//!
//! These tests walk the request-shaped paths an embedding application
//! actually takes: first visit, returning visit, login/logout, flash
//! messages rendered on the next page.

use std::sync::Arc;

use serde_json::json;
use stowage::prelude::*;

fn factory() -> (Arc<MemorySessionStore>, SessionFactory) {
    let store = Arc::new(MemorySessionStore::new());
    let factory = SessionFactory::new(
        store.clone(),
        SessionConfig::new().with_timeout(300),
    )
    .unwrap();
    (store, factory)
}

// =============================================================================
// Visit lifecycle
// =============================================================================

#[tokio::test]
async fn test_first_and_returning_visit() {
    let (_store, factory) = factory();

    // Request 1: no cookie, so no candidate id
    let mut session = factory.session(None).await.unwrap();
    assert!(session.is_new().await.unwrap());
    session.insert("theme", "dark").await.unwrap();
    let cookie_id = session.id().await.unwrap();

    // Request 2: the transport layer verified the cookie and recovered the id
    let mut session = factory.session(Some(&cookie_id)).await.unwrap();
    assert!(!session.is_new().await.unwrap());
    assert_eq!(session.id().await.unwrap(), cookie_id);
    assert_eq!(session.get::<String>("theme").await.unwrap().as_deref(), Some("dark"));
}

#[tokio::test]
async fn test_login_logout_rotates_identity() {
    let (store, factory) = factory();

    let mut session = factory.session(None).await.unwrap();
    session.insert("user_id", 7).await.unwrap();
    let logged_in_id = session.id().await.unwrap();

    // Logout: invalidate, then the very next access serves a clean identity
    session.invalidate().await.unwrap();
    let anonymous_id = session.id().await.unwrap();

    assert_ne!(anonymous_id, logged_in_id);
    assert_eq!(session.get::<i64>("user_id").await.unwrap(), None);
    assert!(!store.exists(&logged_in_id).await.unwrap());
}

// =============================================================================
// Cross-request extensions
// =============================================================================

#[tokio::test]
async fn test_flash_message_shows_on_next_request_only() {
    let (_store, factory) = factory();

    // POST handler queues a notice
    let mut session = factory.session(None).await.unwrap();
    session.flash("profile saved", "", true).await.unwrap();
    let cookie_id = session.id().await.unwrap();

    // Next GET renders and consumes it
    let mut session = factory.session(Some(&cookie_id)).await.unwrap();
    assert_eq!(session.pop_flash("").await.unwrap(), vec![json!("profile saved")]);

    // A refresh shows nothing
    let mut session = factory.session(Some(&cookie_id)).await.unwrap();
    assert!(session.pop_flash("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_csrf_token_stable_across_requests() {
    let (_store, factory) = factory();

    let mut session = factory.session(None).await.unwrap();
    let token = session.get_csrf_token().await.unwrap();
    let cookie_id = session.id().await.unwrap();

    let mut session = factory.session(Some(&cookie_id)).await.unwrap();
    assert_eq!(session.get_csrf_token().await.unwrap(), token);

    // Invalidation discards the token with the rest of the payload
    session.invalidate().await.unwrap();
    assert_ne!(session.get_csrf_token().await.unwrap(), token);
}
