use axum::Json;
use axum::extract::{Query, State};
use tracing::instrument;

use tessera_auth::Principal;
use tessera_core::{AppError, ErrorResponse};

use crate::middleware::auth::{AuthUser, ObservedOrigin, PresentedCredential};
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    LoginRequest, LoginResponse, LogoutParams, LogoutResponse, MessageResponse, OtpLoginRequest,
    RefreshRequest, SendOtpRequest, TokenInfoRequest,
};
use super::service::AuthService;
use super::token_info::TokenInfoResponse;

/// Login with email or phone and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials or inactive account", body = ErrorResponse),
        (status = 400, description = "Bad request - malformed body", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login(
    State(state): State<AppState>,
    ObservedOrigin(origin): ObservedOrigin,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AuthService::login_with_password(&state, dto, &origin).await?;
    Ok(Json(response))
}

/// Login with a one-time password sent to email or phone
#[utoipa::path(
    post,
    path = "/api/auth/login-with-otp",
    request_body = OtpLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Unknown account or invalid code", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login_with_otp(
    State(state): State<AppState>,
    ObservedOrigin(origin): ObservedOrigin,
    ValidatedJson(dto): ValidatedJson<OtpLoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AuthService::login_with_otp(&state, dto, &origin).await?;
    Ok(Json(response))
}

/// Rotate a session using a refresh token
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New credentials under a new session id", body = LoginResponse),
        (status = 401, description = "Refresh token invalid, expired or revoked", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn refresh(
    State(state): State<AppState>,
    ObservedOrigin(origin): ObservedOrigin,
    ValidatedJson(dto): ValidatedJson<RefreshRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AuthService::refresh(&state, dto, &origin).await?;
    Ok(Json(response))
}

/// Revoke the presented credential, optionally on every device
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    params(LogoutParams),
    responses(
        (status = 200, description = "Logout recorded", body = LogoutResponse),
        (status = 401, description = "No credential or undecodable credential", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, token))]
pub async fn logout(
    State(state): State<AppState>,
    PresentedCredential(token): PresentedCredential,
    Query(params): Query<LogoutParams>,
) -> Result<Json<LogoutResponse>, AppError> {
    let all_devices = params.all_devices.unwrap_or(true);
    let response = AuthService::logout(&state, &token, all_devices).await?;
    Ok(Json(response))
}

/// Lifetime report for the current credential
#[utoipa::path(
    get,
    path = "/api/auth/token-info",
    responses(
        (status = 200, description = "Token report", body = TokenInfoResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn token_info(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Json<TokenInfoResponse> {
    Json(AuthService::token_info(&state, &auth_user, None))
}

/// Lifetime report for the current credential compared with supplied tokens
#[utoipa::path(
    post,
    path = "/api/auth/token-info",
    request_body = TokenInfoRequest,
    responses(
        (status = 200, description = "Token report", body = TokenInfoResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn compare_token_info(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<TokenInfoRequest>,
) -> Json<TokenInfoResponse> {
    Json(AuthService::token_info(&state, &auth_user, Some(&dto)))
}

/// Send a one-time password
#[utoipa::path(
    post,
    path = "/api/auth/send-otp",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "Code issued", body = MessageResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse),
        (status = 500, description = "Code could not be stored or delivered", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn send_otp(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<SendOtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let response = AuthService::send_otp(&state, dto).await?;
    Ok(Json(response))
}

/// Verify an email or phone number with a one-time password
#[utoipa::path(
    post,
    path = "/api/auth/verify-otp",
    request_body = OtpLoginRequest,
    responses(
        (status = 200, description = "Channel verified; the code stays valid", body = MessageResponse),
        (status = 401, description = "Invalid code or unknown account", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn verify_otp(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<OtpLoginRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let response = AuthService::verify_otp(&state, dto).await?;
    Ok(Json(response))
}

/// The authenticated principal
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current principal", body = Principal),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn me(auth_user: AuthUser) -> Json<Principal> {
    Json(auth_user.principal)
}
