//! Integration tests for identity resolution
//!
//! Drives `GET /me` through the real router over in-memory stores.

mod common;

use axum::http::StatusCode;
use common::*;
use journey_api::models::Ecosystem;
use serde_json::json;

#[tokio::test]
async fn test_direct_header_resolves_account_and_ecosystems() {
    let app = TestApp::new().with_account("u1", &[Ecosystem::Stars, Ecosystem::Charity]);

    let response = app.send(get("/me", &[("x-user-id", "u1")])).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["account"]["id"], "u1");
    assert_eq!(body["data"]["account"]["isActive"], true);
    assert_eq!(
        body["data"]["ecosystems"],
        json!({
            "stars": true,
            "diamonds": false,
            "gifts": false,
            "marketplace": false,
            "charity": true,
            "leaderboard": false,
            "tasksboard": false,
        })
    );
}

#[tokio::test]
async fn test_successful_authentication_touches_last_active() {
    let app = TestApp::new().with_account("u1", &[]);

    let response = app.send(get("/me", &[("x-user-id", "u1")])).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.accounts.touched(), vec!["u1".to_string()]);
}

#[tokio::test]
async fn test_bearer_token_resolves_account() {
    let app = TestApp::new()
        .trust_identity_header(false)
        .with_account("u2", &[Ecosystem::Gifts]);
    let bearer = app.bearer("u2");

    let response = app.send(get("/me", &[("authorization", bearer.as_str())])).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["account"]["id"], "u2");
    assert_eq!(body["data"]["ecosystems"]["gifts"], true);
}

#[tokio::test]
async fn test_direct_header_wins_over_bearer() {
    let app = TestApp::new().with_account("u1", &[]).with_account("u2", &[]);
    let bearer = app.bearer("u2");

    let response = app
        .send(get("/me", &[("x-user-id", "u1"), ("authorization", bearer.as_str())]))
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["account"]["id"], "u1");
}

#[tokio::test]
async fn test_untrusted_direct_header_is_ignored() {
    let app = TestApp::new()
        .trust_identity_header(false)
        .with_account("u1", &[]);

    let response = app.send(get("/me", &[("x-user-id", "u1")])).await;
    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED").await;
    assert!(app.accounts.touched().is_empty());
}

#[tokio::test]
async fn test_no_identity_is_unauthenticated() {
    let app = TestApp::new().with_account("u1", &[]);

    let response = app.send(get("/me", &[])).await;
    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED").await;
}

#[tokio::test]
async fn test_forged_or_malformed_bearer_is_unauthenticated() {
    let app = TestApp::new().with_account("u1", &[]);

    for value in ["Bearer not-a-jwt", "Basic dTE6cGFzcw==", "Bearer"] {
        let response = app.send(get("/me", &[("authorization", value)])).await;
        assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED").await;
    }
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let app = TestApp::new().with_account("u1", &[]);
    let foreign = journey_api::TokenService::new(journey_api::TokenConfig::new(
        "some-other-secret-that-is-also-long-enough",
    ));
    let bearer = format!("Bearer {}", foreign.issue("u1").unwrap());

    let response = app.send(get("/me", &[("authorization", bearer.as_str())])).await;
    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED").await;
}

#[tokio::test]
async fn test_unknown_account_is_not_found() {
    let app = TestApp::new();

    let response = app.send(get("/me", &[("x-user-id", "ghost")])).await;
    assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[tokio::test]
async fn test_inactive_account_is_forbidden_without_touch() {
    let app = TestApp::new();
    app.accounts.insert(inactive_account("u3"));

    let response = app.send(get("/me", &[("x-user-id", "u3")])).await;
    assert_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;
    assert!(app.accounts.touched().is_empty());
}

#[tokio::test]
async fn test_datastore_failure_is_internal_without_details() {
    let app = TestApp::new().with_account("u1", &[]);
    app.accounts.fail_lookups();

    let response = app.send(get("/me", &[("x-user-id", "u1")])).await;
    let body = assert_error(response, StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL").await;
    assert_eq!(body["message"], "internal server error");
}

#[tokio::test]
async fn test_failed_activity_update_does_not_fail_request() {
    let app = TestApp::new().with_account("u1", &[]);
    app.accounts.fail_touches();

    let response = app.send(get("/me", &[("x-user-id", "u1")])).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_repeated_resolution_is_stable() {
    let app = TestApp::new().with_account("u1", &[Ecosystem::Diamonds, Ecosystem::Tasksboard]);

    let first = body_json(app.send(get("/me", &[("x-user-id", "u1")])).await).await;
    let second = body_json(app.send(get("/me", &[("x-user-id", "u1")])).await).await;
    assert_eq!(first["data"]["ecosystems"], second["data"]["ecosystems"]);
}
