mod common;

use std::sync::Arc;
use std::time::Duration;

use pixshare::error::PixshareError;
use pixshare::http::{RefreshFailureKind, RouteTracker, LOGIN_ROUTE};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use common::{short_timeout, Harness};

async fn mount_refresh(server: &MockServer, response: ResponseTemplate, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(response)
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_images(server: &MockServer, bearer: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path("/api/images"))
        .and(header("authorization", format!("Bearer {bearer}").as_str()))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "images": [] })))
        .mount(server)
        .await;
}

fn rotated_tokens() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "accessToken": "A2",
        "refreshToken": "R2"
    }))
}

#[tokio::test]
async fn request_carries_stored_bearer_token() {
    let server = MockServer::start().await;
    mount_images(&server, "A1", 200).await;
    mount_refresh(&server, rotated_tokens(), 0).await;

    let harness = Harness::new(&server, Some("A1"), Some("R1"));
    let response = harness.client.get("/images").await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(harness.observer.refresh_count(), 0);
}

#[tokio::test]
async fn request_without_token_has_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/images"))
        .and(|req: &Request| !req.headers.contains_key("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "images": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server, None, None);
    harness.client.get("/images").await.unwrap();
}

#[tokio::test]
async fn unauthorized_request_is_replayed_with_refreshed_token() {
    let server = MockServer::start().await;
    mount_images(&server, "A1", 401).await;
    mount_images(&server, "A2", 200).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({ "token": "R1" })))
        .respond_with(rotated_tokens())
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server, Some("A1"), Some("R1"));
    let response = harness.client.get("/images").await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(harness.access().as_deref(), Some("A2"));
    assert_eq!(harness.refresh().as_deref(), Some("R2"));
    assert_eq!(harness.observer.refresh_count(), 1);
    assert_eq!(
        harness.observer.seen.lock().unwrap().as_slice(),
        &[("A2".to_string(), "R2".to_string())]
    );
    assert!(!harness.client.is_refreshing());
}

#[tokio::test]
async fn refresh_without_new_refresh_token_keeps_the_old_one() {
    let server = MockServer::start().await;
    mount_images(&server, "A1", 401).await;
    mount_images(&server, "A2", 200).await;
    mount_refresh(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "token": "A2" })),
        1,
    )
    .await;

    let harness = Harness::new(&server, Some("A1"), Some("R1"));
    harness.client.get("/images").await.unwrap();

    assert_eq!(harness.access().as_deref(), Some("A2"));
    assert_eq!(harness.refresh().as_deref(), Some("R1"));
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
    let server = MockServer::start().await;
    mount_images(&server, "A1", 401).await;
    mount_images(&server, "A2", 200).await;
    mount_refresh(
        &server,
        rotated_tokens().set_delay(Duration::from_millis(200)),
        1,
    )
    .await;

    let harness = Harness::new(&server, Some("A1"), Some("R1"));
    let requests = (0..5).map(|_| {
        let client = harness.client.clone();
        async move { client.get("/images").await }
    });
    let results = futures::future::join_all(requests).await;

    for result in results {
        assert_eq!(result.unwrap().status(), 200);
    }
    assert_eq!(harness.observer.refresh_count(), 1);
    assert_eq!(harness.access().as_deref(), Some("A2"));
    assert!(!harness.client.is_refreshing());
    server.verify().await;
}

#[tokio::test]
async fn replayed_request_is_not_recovered_twice() {
    let server = MockServer::start().await;
    mount_images(&server, "A1", 401).await;
    mount_images(&server, "A2", 401).await;
    mount_refresh(&server, rotated_tokens(), 1).await;

    let harness = Harness::new(&server, Some("A1"), Some("R1"));
    let err = harness.client.get("/images").await.unwrap_err();

    assert!(matches!(err, PixshareError::Api { status: 401, .. }));
    assert_eq!(harness.observer.refresh_count(), 1);
    server.verify().await;
}

#[tokio::test]
async fn rejected_refresh_token_clears_session_and_redirects_to_login() {
    let server = MockServer::start().await;
    mount_images(&server, "A1", 401).await;
    mount_refresh(
        &server,
        ResponseTemplate::new(403).set_body_json(json!({ "message": "Refresh token revoked" })),
        1,
    )
    .await;

    let navigator = Arc::new(RouteTracker::new("/gallery"));
    let harness =
        Harness::new(&server, Some("A1"), Some("R1")).with_navigator(navigator.clone());
    let err = harness.client.get("/images").await.unwrap_err();

    match err {
        PixshareError::Refresh(failure) => {
            assert_eq!(failure.kind, RefreshFailureKind::Credential);
            assert_eq!(failure.status, Some(403));
            assert_eq!(failure.message, "Refresh token revoked");
        }
        other => panic!("expected refresh failure, got {other:?}"),
    }
    assert_eq!(harness.access(), None);
    assert_eq!(harness.refresh(), None);
    assert_eq!(harness.observer.clear_count(), 1);
    assert_eq!(navigator.forced(), vec![LOGIN_ROUTE.to_string()]);
    assert!(!harness.client.is_refreshing());
}

#[tokio::test]
async fn concurrent_requests_share_one_rejected_refresh() {
    let server = MockServer::start().await;
    mount_images(&server, "A1", 401).await;
    mount_refresh(
        &server,
        ResponseTemplate::new(403)
            .set_body_json(json!({ "message": "Refresh token revoked" }))
            .set_delay(Duration::from_millis(200)),
        1,
    )
    .await;

    let navigator = Arc::new(RouteTracker::new("/gallery"));
    let harness =
        Harness::new(&server, Some("A1"), Some("R1")).with_navigator(navigator.clone());
    let requests = (0..5).map(|_| {
        let client = harness.client.clone();
        async move { client.get("/images").await }
    });
    let results = futures::future::join_all(requests).await;

    for result in results {
        match result {
            Err(PixshareError::Refresh(failure)) => {
                assert_eq!(failure.kind, RefreshFailureKind::Credential);
                assert_eq!(failure.message, "Refresh token revoked");
            }
            other => panic!("expected refresh failure, got {other:?}"),
        }
    }
    assert_eq!(harness.access(), None);
    assert_eq!(harness.refresh(), None);
    assert_eq!(harness.observer.clear_count(), 1);
    assert_eq!(harness.observer.refresh_count(), 0);
    assert_eq!(navigator.forced(), vec![LOGIN_ROUTE.to_string()]);
    assert!(!harness.client.is_refreshing());
    server.verify().await;
}

#[tokio::test]
async fn no_redirect_when_already_on_an_auth_route() {
    for route in ["/login", "/register"] {
        let server = MockServer::start().await;
        mount_images(&server, "A1", 401).await;
        mount_refresh(&server, ResponseTemplate::new(401), 1).await;

        let navigator = Arc::new(RouteTracker::new(route));
        let harness =
            Harness::new(&server, Some("A1"), Some("R1")).with_navigator(navigator.clone());
        harness.client.get("/images").await.unwrap_err();

        assert_eq!(harness.access(), None, "tokens cleared on {route}");
        assert!(navigator.forced().is_empty(), "no redirect from {route}");
    }
}

#[tokio::test]
async fn server_error_during_refresh_keeps_tokens() {
    let server = MockServer::start().await;
    mount_images(&server, "A1", 401).await;
    mount_refresh(&server, ResponseTemplate::new(500), 1).await;

    let navigator = Arc::new(RouteTracker::new("/gallery"));
    let harness =
        Harness::new(&server, Some("A1"), Some("R1")).with_navigator(navigator.clone());
    let err = harness.client.get("/images").await.unwrap_err();

    assert!(matches!(
        err,
        PixshareError::Refresh(ref f) if f.kind == RefreshFailureKind::Transient
    ));
    assert_eq!(harness.access().as_deref(), Some("A1"));
    assert_eq!(harness.refresh().as_deref(), Some("R1"));
    assert!(navigator.forced().is_empty());
    assert_eq!(harness.observer.clear_count(), 0);
}

#[tokio::test]
async fn network_failure_during_refresh_keeps_tokens() {
    let server = MockServer::start().await;
    mount_images(&server, "A1", 401).await;
    mount_refresh(
        &server,
        rotated_tokens().set_delay(Duration::from_secs(3)),
        1,
    )
    .await;

    let navigator = Arc::new(RouteTracker::new("/gallery"));
    let harness = Harness::with_config(short_timeout(&server), Some("A1"), Some("R1"))
        .with_navigator(navigator.clone());
    let err = harness.client.get("/images").await.unwrap_err();

    match err {
        PixshareError::Refresh(failure) => {
            assert_eq!(failure.kind, RefreshFailureKind::Transient);
            assert_eq!(failure.status, None);
        }
        other => panic!("expected refresh failure, got {other:?}"),
    }
    assert_eq!(harness.access().as_deref(), Some("A1"));
    assert_eq!(harness.refresh().as_deref(), Some("R1"));
    assert!(navigator.forced().is_empty());
}

#[tokio::test]
async fn missing_refresh_token_fails_without_calling_refresh() {
    let server = MockServer::start().await;
    mount_images(&server, "A1", 401).await;
    mount_refresh(&server, rotated_tokens(), 0).await;

    let navigator = Arc::new(RouteTracker::new("/gallery"));
    let harness = Harness::new(&server, Some("A1"), None).with_navigator(navigator.clone());
    let err = harness.client.get("/images").await.unwrap_err();

    assert!(matches!(err, PixshareError::Refresh(ref f) if f.is_credential()));
    assert_eq!(harness.access(), None);
    assert_eq!(navigator.forced(), vec![LOGIN_ROUTE.to_string()]);
    server.verify().await;
}

#[tokio::test]
async fn refresh_response_without_access_token_is_transient() {
    let server = MockServer::start().await;
    mount_images(&server, "A1", 401).await;
    mount_refresh(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "ok": true })),
        1,
    )
    .await;

    let harness = Harness::new(&server, Some("A1"), Some("R1"));
    let err = harness.client.get("/images").await.unwrap_err();

    assert!(matches!(err, PixshareError::Refresh(ref f) if !f.is_credential()));
    assert_eq!(harness.access().as_deref(), Some("A1"));
}

#[tokio::test]
async fn non_unauthorized_errors_pass_through_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/images/9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Image not found" })))
        .mount(&server)
        .await;
    mount_refresh(&server, rotated_tokens(), 0).await;

    let harness = Harness::new(&server, Some("A1"), Some("R1"));
    let err = harness.client.get("/images/9").await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "API error (status 404): Image not found");
    server.verify().await;
}
