//! End-to-end authorisation tests.
//!
//! Tokens are minted over HTTP and redeemed through the
//! `DocumentAccessAuthoriser` interface the synchronization engine uses.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use access_token_service::services::DocumentAccessAuthoriser;
use access_token_test_utils::TestTokenServer;
use chrono::Duration;
use std::collections::HashMap;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[tokio::test]
async fn test_create_token_authorises_exactly_once() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;
    let authenticator = server.authenticator();

    let token = server.request_token("create", "alice").await?;

    assert!(authenticator.authorise_create(&token, "alice"));
    assert!(!authenticator.authorise_create(&token, "alice"));
    assert_eq!(authenticator.live_tokens(), 0);

    Ok(())
}

#[tokio::test]
async fn test_join_token_authorises_exactly_once() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;
    let authenticator = server.authenticator();

    let token = server.request_token("join", "doc42").await?;

    assert!(authenticator.authorise_join(&token, "doc42"));
    assert!(!authenticator.authorise_join(&token, "doc42"));

    Ok(())
}

#[tokio::test]
async fn test_token_bound_to_its_value() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;
    let authenticator = server.authenticator();

    let token = server.request_token("join", "doc42").await?;

    assert!(!authenticator.authorise_join(&token, "doc43"));
    assert!(!authenticator.authorise_join(&token, ""));
    assert!(authenticator.authorise_join(&token, "doc42"));

    Ok(())
}

#[tokio::test]
async fn test_create_token_not_usable_for_join() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;
    let authenticator = server.authenticator();

    let token = server.request_token("create", "alice").await?;

    assert!(!authenticator.authorise_join(&token, "alice"));
    // The failed join did not burn it.
    assert!(authenticator.authorise_create(&token, "alice"));

    Ok(())
}

#[tokio::test]
async fn test_unknown_token_is_refused() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;
    let authenticator = server.authenticator();

    assert!(!authenticator.authorise_create("not-a-token", "alice"));
    assert!(!authenticator.authorise_join("", "doc42"));

    Ok(())
}

#[tokio::test]
async fn test_zero_expiry_join_token_never_authorises() -> Result<(), anyhow::Error> {
    let server =
        TestTokenServer::spawn_with_vars(vars(&[("AUTH_EXPIRY_PERIOD_S", "0")])).await?;
    let authenticator = server.authenticator();

    let token = server.request_token("join", "doc42").await?;
    server.advance_clock(Duration::seconds(1));

    assert!(!authenticator.authorise_join(&token, "doc42"));

    Ok(())
}

#[tokio::test]
async fn test_token_expires_after_period() -> Result<(), anyhow::Error> {
    let server =
        TestTokenServer::spawn_with_vars(vars(&[("AUTH_EXPIRY_PERIOD_S", "10")])).await?;
    let authenticator = server.authenticator();

    let early = server.request_token("join", "doc1").await?;
    let late = server.request_token("join", "doc2").await?;

    server.advance_clock(Duration::seconds(9));
    assert!(authenticator.authorise_join(&early, "doc1"));

    server.advance_clock(Duration::seconds(1));
    assert!(!authenticator.authorise_join(&late, "doc2"));

    Ok(())
}

#[tokio::test]
async fn test_expired_tokens_swept_on_next_issue() -> Result<(), anyhow::Error> {
    let server =
        TestTokenServer::spawn_with_vars(vars(&[("AUTH_EXPIRY_PERIOD_S", "10")])).await?;
    let authenticator = server.authenticator();

    server.request_token("create", "alice").await?;
    server.request_token("create", "bob").await?;
    assert_eq!(authenticator.live_tokens(), 2);

    server.advance_clock(Duration::seconds(11));
    server.request_token("create", "carol").await?;

    assert_eq!(authenticator.live_tokens(), 1);

    Ok(())
}

#[tokio::test]
async fn test_create_disabled_refuses_create() -> Result<(), anyhow::Error> {
    let server =
        TestTokenServer::spawn_with_vars(vars(&[("AUTH_ALLOW_CREATE", "false")])).await?;
    let authenticator = server.authenticator();

    // Issuance still works; redemption is what is refused.
    let create_token = server.request_token("create", "alice").await?;
    let join_token = server.request_token("join", "doc42").await?;

    assert!(!authenticator.authorise_create(&create_token, "alice"));
    assert!(authenticator.authorise_join(&join_token, "doc42"));

    Ok(())
}
