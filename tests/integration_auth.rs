mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;

use common::{
    ORIGIN, PASSWORD, active_user, body_json, get_with_bearer, login, post_json,
    post_with_bearer, settings, spawn_app, spawn_app_with, token,
};
use tessera_config::ApiMode;

#[tokio::test]
async fn test_login_success_returns_triad() {
    let user = active_user();
    let email = user.email.clone().unwrap();
    let app = spawn_app(vec![user.clone()]);

    let body = login(&app, &email).await;

    assert_eq!(body["token_type"], "bearer");
    assert!(body["access_token"].is_string());
    assert!(body["session_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert_eq!(body["user"]["user_id"], user.user_id.to_string());
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"]["last_sign_in_at"].is_string());
}

#[tokio::test]
async fn test_login_by_phone_number() {
    let user = active_user();
    let phone = user.phone_number.clone().unwrap();
    let app = spawn_app(vec![user]);

    let body = login(&app, &phone).await;
    assert!(body["session_id"].is_string());
}

#[tokio::test]
async fn test_each_login_gets_fresh_session_id() {
    let user = active_user();
    let email = user.email.clone().unwrap();
    let app = spawn_app(vec![user]);

    let first = login(&app, &email).await;
    let second = login(&app, &email).await;
    assert_ne!(first["session_id"], second["session_id"]);
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let user = active_user();
    let email = user.email.clone().unwrap();
    let app = spawn_app(vec![user]);

    let response = app
        .send(post_json(
            "/api/auth/login",
            json!({ "username": email, "password": "not-the-password" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    assert_eq!(body_json(response).await["error"], "Unauthorized");
}

#[tokio::test]
async fn test_login_unknown_account_is_unauthorized() {
    let app = spawn_app(vec![]);

    let response = app
        .send(post_json(
            "/api/auth/login",
            json!({ "username": "nobody@example.com", "password": PASSWORD }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_without_password_hash_is_unauthorized() {
    let mut otp_only = active_user();
    otp_only.password_hash = None;
    let app = spawn_app(vec![otp_only.clone()]);

    // Missing accounts are checked against a decoy hash at the configured cost.
    assert!(app.state.decoy_password_hash.starts_with("$2b$04$"));

    let response = app
        .send(post_json(
            "/api/auth/login",
            json!({ "username": otp_only.email.unwrap(), "password": PASSWORD }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_inactive_or_unverified_is_unauthorized() {
    let mut inactive = active_user();
    inactive.is_active = false;
    let mut unverified = active_user();
    unverified.is_verified = false;
    let app = spawn_app(vec![inactive.clone(), unverified.clone()]);

    for user in [inactive, unverified] {
        let response = app
            .send(post_json(
                "/api/auth/login",
                json!({ "username": user.email.unwrap(), "password": PASSWORD }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_login_validation_error() {
    let app = spawn_app(vec![]);

    let response = app
        .send(post_json(
            "/api/auth/login",
            json!({ "username": "", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .send(post_json("/api/auth/login", json!({ "password": PASSWORD })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_me_with_session_token_carries_profile() {
    let user = active_user();
    let app = spawn_app(vec![user.clone()]);
    let body = login(&app, user.email.as_deref().unwrap()).await;

    let response = app
        .send(get_with_bearer("/api/auth/me", token(&body, "session_token")))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let principal = body_json(response).await;
    assert_eq!(principal["subject"], user.user_id.to_string());
    assert_eq!(principal["kind"], "session");
    assert_eq!(principal["session_id"], body["session_id"]);
    assert_eq!(principal["permissions"], json!(["view_profile", "edit_profile"]));
    assert_eq!(principal["groups"], json!(["members"]));
}

#[tokio::test]
async fn test_me_with_access_token_has_status_only() {
    let user = active_user();
    let app = spawn_app(vec![user.clone()]);
    let body = login(&app, user.email.as_deref().unwrap()).await;

    let response = app
        .send(get_with_bearer("/api/auth/me", token(&body, "access_token")))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let principal = body_json(response).await;
    assert_eq!(principal["kind"], "access");
    assert_eq!(principal["is_active"], true);
    assert_eq!(principal["permissions"], json!([]));
}

#[tokio::test]
async fn test_me_rejects_refresh_token() {
    let user = active_user();
    let app = spawn_app(vec![user.clone()]);
    let body = login(&app, user.email.as_deref().unwrap()).await;

    let response = app
        .send(get_with_bearer("/api/auth/me", token(&body, "refresh_token")))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_without_credential_is_unauthorized() {
    let app = spawn_app(vec![]);

    let response = app
        .send(
            Request::builder()
                .uri("/api/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
}

#[tokio::test]
async fn test_session_header_takes_precedence_over_authorization() {
    let user = active_user();
    let app = spawn_app(vec![user.clone()]);
    let body = login(&app, user.email.as_deref().unwrap()).await;

    let response = app
        .send(
            Request::builder()
                .uri("/api/auth/me")
                .header("x-session-token", token(&body, "session_token"))
                .header("authorization", "Bearer not-a-token")
                .header("origin", ORIGIN)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["kind"], "session");
}

#[tokio::test]
async fn test_query_parameter_credential_is_accepted() {
    let user = active_user();
    let app = spawn_app(vec![user.clone()]);
    let body = login(&app, user.email.as_deref().unwrap()).await;

    let response = app
        .send(
            Request::builder()
                .uri(format!(
                    "/api/auth/me?access_token={}",
                    token(&body, "access_token")
                ))
                .header("origin", ORIGIN)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rotates_session_and_rejects_replay() {
    let user = active_user();
    let app = spawn_app(vec![user.clone()]);
    let body = login(&app, user.email.as_deref().unwrap()).await;
    let refresh_token = token(&body, "refresh_token").to_string();

    let response = app
        .send(post_json(
            "/api/auth/refresh",
            json!({ "refresh_token": refresh_token }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    assert_ne!(rotated["session_id"], body["session_id"]);

    let replay = app
        .send(post_json(
            "/api/auth/refresh",
            json!({ "refresh_token": refresh_token }),
        ))
        .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    let old_session = app
        .send(get_with_bearer("/api/auth/me", token(&body, "session_token")))
        .await;
    assert_eq!(old_session.status(), StatusCode::UNAUTHORIZED);

    let new_session = app
        .send(get_with_bearer("/api/auth/me", token(&rotated, "session_token")))
        .await;
    assert_eq!(new_session.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rejects_other_credential_kinds() {
    let user = active_user();
    let app = spawn_app(vec![user.clone()]);
    let body = login(&app, user.email.as_deref().unwrap()).await;

    for kind in ["access_token", "session_token"] {
        let response = app
            .send(post_json(
                "/api/auth/refresh",
                json!({ "refresh_token": token(&body, kind) }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_origin_mismatch_rejected_in_production() {
    let user = active_user();
    let app = spawn_app_with(settings(ApiMode::Production), vec![user.clone()]);
    let body = login(&app, user.email.as_deref().unwrap()).await;
    let session_token = token(&body, "session_token");

    let same_origin = app
        .send(get_with_bearer("/api/auth/me", session_token))
        .await;
    assert_eq!(same_origin.status(), StatusCode::OK);

    let other_origin = app
        .send(
            Request::builder()
                .uri("/api/auth/me")
                .header("authorization", format!("Bearer {session_token}"))
                .header("origin", "https://evil.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(other_origin.status(), StatusCode::UNAUTHORIZED);

    let localhost = app
        .send(
            Request::builder()
                .uri("/api/auth/me")
                .header("authorization", format!("Bearer {session_token}"))
                .header("origin", "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(localhost.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_localhost_origin_allowed_in_development() {
    let user = active_user();
    let app = spawn_app(vec![user.clone()]);
    let body = login(&app, user.email.as_deref().unwrap()).await;

    let response = app
        .send(
            Request::builder()
                .uri("/api/auth/me")
                .header(
                    "authorization",
                    format!("Bearer {}", token(&body, "session_token")),
                )
                .header("origin", "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_origin_comparison_ignores_case_and_trailing_slash() {
    let user = active_user();
    let app = spawn_app_with(settings(ApiMode::Production), vec![user.clone()]);
    let body = login(&app, user.email.as_deref().unwrap()).await;

    let response = app
        .send(
            Request::builder()
                .uri("/api/auth/me")
                .header(
                    "authorization",
                    format!("Bearer {}", token(&body, "access_token")),
                )
                .header("origin", "HTTPS://App.Example.com/")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_token_info_for_current_credential() {
    let user = active_user();
    let app = spawn_app(vec![user.clone()]);
    let body = login(&app, user.email.as_deref().unwrap()).await;

    let response = app
        .send(get_with_bearer("/api/auth/token-info", token(&body, "access_token")))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let info = body_json(response).await;
    assert_eq!(info["current"]["token_type"], "access");
    assert_eq!(info["current"]["is_expired"], false);
    assert_eq!(info["current"]["session_id"], body["session_id"]);
    assert_eq!(info["token_configuration"]["access_token"]["expiry_minutes"], 60);
    assert_eq!(info["token_configuration"]["access_token"]["expires_in"], "1 hour");
    assert_eq!(info["token_configuration"]["refresh_token"]["expires_in"], "4 weeks and 2 days");
    assert_eq!(info["extension_info"]["extension_minutes"], 60);
}

#[tokio::test]
async fn test_token_info_reports_supplied_tokens() {
    let user = active_user();
    let app = spawn_app(vec![user.clone()]);
    let body = login(&app, user.email.as_deref().unwrap()).await;

    let mut request = post_json(
        "/api/auth/token-info",
        json!({
            "access_token": "garbage",
            "refresh_token": token(&body, "refresh_token"),
        }),
    );
    request.headers_mut().insert(
        "x-session-token",
        token(&body, "session_token").parse().unwrap(),
    );

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let info = body_json(response).await;
    assert_eq!(info["current"]["token_type"], "session");
    assert!(info["access_token"]["error"].is_string());
    assert_eq!(info["refresh_token"]["token_type"], "refresh");
    assert!(info.get("session_token").is_none());
}

#[tokio::test]
async fn test_token_info_requires_credential() {
    let app = spawn_app(vec![]);

    let response = app
        .send(post_with_bearer("/api/auth/token-info", "not-a-token"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = spawn_app(vec![]);

    let response = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-request-id").is_some());

    let response = app
        .send(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/api/auth/login"].is_object());
}
