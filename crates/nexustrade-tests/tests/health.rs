//! Health check endpoint tests.

use nexustrade_tests::TestServer;

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::spawn_default().await;
    let client = server.client();

    let health = client.health_check().await.expect("health check failed");

    assert_eq!(health.status, "healthy");
    assert!(!health.version.is_empty());
}

#[tokio::test]
async fn test_every_response_carries_security_headers() {
    let server = TestServer::spawn_default().await;

    let response = reqwest::get(format!("{}/health", server.base_url))
        .await
        .expect("request failed");

    assert_eq!(
        response.headers().get("Cache-Control").unwrap(),
        "no-store"
    );
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn test_non_post_method_is_rejected_with_headers() {
    let server = TestServer::spawn_default().await;

    let response = reqwest::get(format!("{}/api/analyze", server.base_url))
        .await
        .expect("request failed");

    assert_eq!(response.status().as_u16(), 405);
    // The security headers apply to 405s too.
    assert_eq!(
        response.headers().get("Cache-Control").unwrap(),
        "no-store"
    );
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
}
