//! License activation endpoint tests.

use nexustrade_backend::auth::Plan;
use nexustrade_backend::models::Signal as BackendSignal;
use nexustrade_client::Error;
use nexustrade_tests::{
    LICENSE_SECRET, MockIdentity, MockModel, TestServer, VALID_TOKEN, confirmed_verdict,
    test_config,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;

fn free_server() -> (Arc<MockIdentity>, Arc<MockModel>) {
    (
        MockIdentity::with_plan(Plan::Free),
        MockModel::returning(confirmed_verdict(BackendSignal::Buy, 0.87)),
    )
}

#[tokio::test]
async fn test_exact_key_activates_pro() {
    let (identity, model) = free_server();
    let server = TestServer::spawn(test_config(), identity, model).await;
    let client = server.client();

    let response = client
        .activate_license(VALID_TOKEN, LICENSE_SECRET)
        .await
        .expect("activation failed");

    assert!(response.ok);
    assert_eq!(server.identity.plan(), Plan::Pro);
    assert_eq!(server.identity.set_plan_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_key_comparison_ignores_case_and_whitespace() {
    let (identity, model) = free_server();
    let server = TestServer::spawn(test_config(), identity, model).await;
    let client = server.client();

    let response = client
        .activate_license(VALID_TOKEN, " nx-nexus-trade ")
        .await
        .expect("activation failed");

    assert!(response.ok);
    assert_eq!(server.identity.plan(), Plan::Pro);
}

#[tokio::test]
async fn test_activation_is_idempotent() {
    let (identity, model) = free_server();
    let server = TestServer::spawn(test_config(), identity, model).await;
    let client = server.client();

    let first = client
        .activate_license(VALID_TOKEN, LICENSE_SECRET)
        .await
        .expect("first activation failed");
    let second = client
        .activate_license(VALID_TOKEN, LICENSE_SECRET)
        .await
        .expect("second activation failed");

    assert!(first.ok);
    assert!(second.ok);
    assert_eq!(server.identity.plan(), Plan::Pro);
}

#[tokio::test]
async fn test_substantively_different_key_is_rejected() {
    let (identity, model) = free_server();
    let server = TestServer::spawn(test_config(), identity, model).await;
    let client = server.client();

    let error = client
        .activate_license(VALID_TOKEN, "NX-NEXUS-TRADE-EXTRA")
        .await
        .unwrap_err();

    assert!(matches!(error, Error::Forbidden(_)));
    assert_eq!(server.identity.plan(), Plan::Free);
    assert_eq!(server.identity.set_plan_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_key_is_bad_request() {
    let (identity, model) = free_server();
    let server = TestServer::spawn(test_config(), identity, model).await;
    let client = server.client();

    let error = client
        .activate_license(VALID_TOKEN, "   ")
        .await
        .unwrap_err();

    assert!(matches!(error, Error::Api { status: 400, .. }));
}

#[tokio::test]
async fn test_unknown_token_cannot_activate() {
    let (identity, model) = free_server();
    let server = TestServer::spawn(test_config(), identity, model).await;
    let client = server.client();

    let error = client
        .activate_license("stolen-token", LICENSE_SECRET)
        .await
        .unwrap_err();

    assert!(matches!(error, Error::Unauthenticated(_)));
    assert_eq!(server.identity.plan(), Plan::Free);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let server = TestServer::spawn_default().await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/activate", server.base_url))
        .header("Authorization", format!("Bearer {VALID_TOKEN}"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("request failed");

    assert_eq!(response.status().as_u16(), 400);
}
