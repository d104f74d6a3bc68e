mod common;

use chrono::{Duration, Utc};
use common::{harness, logged_in, token_body};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use spotcli::{error::Error, management::CredentialStore};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

async fn mount_refresh(server: &MockServer, new_token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(new_token, None)))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_request_attaches_bearer_and_parses_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer valid-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "u1", "display_name": "Ana"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, "unused", 0).await;
    let h = harness(&server, Some(logged_in("valid-token")));

    let body = h.client.get("me").await.unwrap();

    assert_eq!(body["display_name"], "Ana");
}

#[tokio::test]
async fn test_request_sends_json_body_and_accepts_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/playlists/p1/followers"))
        .and(body_json(json!({"public": true})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server, Some(logged_in("valid-token")));

    let body = h
        .client
        .request(
            Method::PUT,
            "playlists/p1/followers",
            Some(&json!({"public": true})),
        )
        .await
        .unwrap();

    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_expired_token_is_refreshed_before_the_call() {
    let server = MockServer::start().await;
    mount_refresh(&server, "new-token", 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer new-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u1"})))
        .expect(1)
        .mount(&server)
        .await;
    let mut credentials = logged_in("stale-token");
    credentials.expires_at = Some(Utc::now() - Duration::minutes(5));
    let h = harness(&server, Some(credentials));

    h.client.get("me").await.unwrap();

    let stored = h.store.load().await.unwrap().unwrap();
    assert_eq!(stored.access_token.as_deref(), Some("new-token"));
    assert!(stored.expires_at.unwrap() > Utc::now());
}

#[tokio::test]
async fn test_unauthorized_refreshes_once_and_retries() {
    let server = MockServer::start().await;
    mount_refresh(&server, "new-token", 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer skewed-token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer new-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u1"})))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server, Some(logged_in("skewed-token")));

    let body = h.client.get("me").await.unwrap();

    assert_eq!(body["id"], "u1");
}

#[tokio::test]
async fn test_second_unauthorized_is_fatal() {
    let server = MockServer::start().await;
    mount_refresh(&server, "new-token", 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    let h = harness(&server, Some(logged_in("skewed-token")));

    let err = h.client.get("me").await.unwrap_err();

    assert!(matches!(err, Error::AuthRefresh(_)));
}

#[tokio::test]
async fn test_forbidden_maps_to_scope_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/player/play"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server, Some(logged_in("valid-token")));

    let err = h.client.put("me/player/play", None).await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    match err {
        Error::AuthScope { endpoint, scope } => {
            assert_eq!(endpoint, "me/player/play");
            assert!(scope.is_none());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_is_surfaced_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/playlists"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server, Some(logged_in("valid-token")));

    let err = h.client.get("me/playlists").await.unwrap_err();

    assert!(matches!(err, Error::RateLimit { retry_after: Some(7) }));
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/playlists/p1/followers"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({
            "error": {"status": 502, "message": "Bad gateway"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server, Some(logged_in("valid-token")));

    let err = h
        .client
        .put("playlists/p1/followers", Some(&json!({"public": true})))
        .await
        .unwrap_err();

    match err {
        Error::Api { status, message } => {
            assert_eq!(status, StatusCode::BAD_GATEWAY);
            assert_eq!(message, "Bad gateway");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_request_without_credentials() {
    let server = MockServer::start().await;
    let h = harness(&server, None);

    let err = h.client.get("me").await.unwrap_err();

    assert!(matches!(err, Error::NotLoggedIn));
}

#[tokio::test]
async fn test_concurrent_calls_share_a_single_refresh() {
    let server = MockServer::start().await;
    mount_refresh(&server, "new-token", 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer new-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u1"})))
        .expect(3)
        .mount(&server)
        .await;
    let mut credentials = logged_in("stale-token");
    credentials.expires_at = Some(Utc::now() - Duration::minutes(5));
    let h = harness(&server, Some(credentials));

    let (first, second, third) = tokio::join!(
        h.client.get("me"),
        h.client.get("me"),
        h.client.get("me")
    );

    for body in [first, second, third] {
        assert_eq!(body.unwrap()["id"], "u1");
    }
}
