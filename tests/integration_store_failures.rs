mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::{
    FlakyRevocations, ORIGIN, active_user, body_json, get_with_bearer, login, post_json,
    post_with_bearer, spawn_app_with_revocations, token,
};
use tessera::middleware::auth::CredentialValidator;
use tessera_core::{AuthError, RevocationScope};

#[tokio::test]
async fn test_unreadable_store_fails_closed() {
    let user = active_user();
    let revocations = Arc::new(FlakyRevocations::new());
    let app = spawn_app_with_revocations(vec![user.clone()], revocations.clone());
    let body = login(&app, user.email.as_deref().unwrap()).await;
    let session_token = token(&body, "session_token");

    revocations.fail_reads(true);

    let response = app.send(get_with_bearer("/api/auth/me", session_token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let err = CredentialValidator::new(&app.state)
        .validate(session_token, ORIGIN)
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::StoreUnavailable);

    revocations.fail_reads(false);
    let response = app.send(get_with_bearer("/api/auth/me", session_token)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_aborts_when_rotation_cannot_be_recorded() {
    let user = active_user();
    let revocations = Arc::new(FlakyRevocations::new());
    let app = spawn_app_with_revocations(vec![user.clone()], revocations.clone());
    let body = login(&app, user.email.as_deref().unwrap()).await;
    let refresh = json!({ "refresh_token": token(&body, "refresh_token") });

    revocations.fail_writes_in(RevocationScope::Session);
    let response = app.send(post_json("/api/auth/refresh", refresh.clone())).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Nothing was rotated, so the old session is still live.
    let response = app
        .send(get_with_bearer("/api/auth/me", token(&body, "session_token")))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    revocations.heal_writes();
    let response = app.send(post_json("/api/auth/refresh", refresh)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_reports_partial_failure() {
    let user = active_user();
    let revocations = Arc::new(FlakyRevocations::new());
    let app = spawn_app_with_revocations(vec![user.clone()], revocations.clone());
    let body = login(&app, user.email.as_deref().unwrap()).await;

    revocations.fail_writes_in(RevocationScope::Token);
    let response = app
        .send(post_with_bearer(
            "/api/auth/logout?all_devices=false",
            token(&body, "access_token"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"]["token_revoked"], false);
    assert_eq!(body["status"]["refresh_tokens_revoked"], true);
    assert!(body["status"]["sessions_revoked"].is_null());
    assert_eq!(body["status"]["all_succeeded"], false);
    assert_eq!(
        body["message"],
        "Logged out, but some revocations could not be recorded"
    );
}

#[tokio::test]
async fn test_concurrent_refreshes_rotate_once() {
    let user = active_user();
    let revocations = Arc::new(FlakyRevocations::with_read_delay(Duration::from_millis(5)));
    let app = spawn_app_with_revocations(vec![user.clone()], revocations);
    let body = login(&app, user.email.as_deref().unwrap()).await;
    let refresh = json!({ "refresh_token": token(&body, "refresh_token") });

    let (first, second) = tokio::join!(
        app.send(post_json("/api/auth/refresh", refresh.clone())),
        app.send(post_json("/api/auth/refresh", refresh)),
    );

    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::UNAUTHORIZED]);
}
