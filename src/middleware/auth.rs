//! Credential extraction and validation for protected endpoints.
//!
//! A credential is taken from the first of these that is present:
//!
//! 1. `X-Session-Token` header
//! 2. `Authorization: Bearer <token>`
//! 3. any-case `bearer` scheme with loose whitespace
//! 4. `access_token` query parameter
//!
//! [`CredentialValidator`] then decodes it, rejects refresh credentials, checks
//! the token, session and user revocation scopes in that order, and finally
//! checks origin binding.

use axum::{
    extract::{FromRequestParts, Query},
    http::{HeaderMap, Uri, header, request::Parts},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use serde::Deserialize;
use tracing::{debug, error};

use tessera_auth::{ClaimSet, ExpiryPolicy, Principal, TokenCodec, origins_match};
use tessera_cache::RevocationStore;
use tessera_config::ApiMode;
use tessera_core::{AppError, AuthError, RevocationScope};

use crate::metrics::{track_store_error, track_validation_failure};
use crate::state::AppState;

pub const SESSION_TOKEN_HEADER: &str = "x-session-token";
const FORWARDED_PROTO: &str = "x-forwarded-proto";
const FORWARDED_HOST: &str = "x-forwarded-host";

#[derive(Debug, Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Finds the presented bearer string, if any.
pub fn extract_bearer(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    if let Some(token) = headers
        .get(SESSION_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(non_empty)
    {
        return Some(token);
    }

    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        if let Some(token) = non_empty(bearer.token()) {
            return Some(token);
        }
    }

    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().split_once(char::is_whitespace))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .and_then(|(_, token)| non_empty(token))
    {
        return Some(token);
    }

    Query::<TokenQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(q)| q.access_token)
        .and_then(|t| non_empty(&t))
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// The origin the request came from, as `scheme://host[:port]`.
pub fn observed_origin(headers: &HeaderMap, uri: &Uri) -> String {
    let forwarded_proto = header_str(headers, FORWARDED_PROTO).map(|p| p.to_ascii_lowercase());

    if let Some(origin) = header_str(headers, header::ORIGIN.as_str()).filter(|o| *o != "null") {
        return origin.to_string();
    }

    if let Some(host) = header_str(headers, header::HOST.as_str()) {
        let scheme = if forwarded_proto.as_deref() == Some("https") {
            "https"
        } else {
            "http"
        };
        return format!("{scheme}://{host}");
    }

    if let Some(host) = header_str(headers, FORWARDED_HOST) {
        let scheme = forwarded_proto.as_deref().unwrap_or("https");
        return format!("{scheme}://{host}");
    }

    if let Some(authority) = uri.authority() {
        let scheme = uri.scheme_str().unwrap_or("http");
        return format!("{scheme}://{authority}");
    }

    "http://localhost".to_string()
}

/// Fails with `Revoked(scope)` on an active record and `StoreUnavailable`
/// when the store cannot answer.
pub async fn ensure_not_revoked(
    revocations: &dyn RevocationStore,
    scope: RevocationScope,
    key: &str,
) -> Result<(), AuthError> {
    match revocations.is_marked(scope, key).await {
        Ok(false) => Ok(()),
        Ok(true) => Err(AuthError::Revoked(scope)),
        Err(e) => {
            error!(error = %e, scope = %scope, "Revocation lookup failed");
            track_store_error("read");
            Err(AuthError::StoreUnavailable)
        }
    }
}

#[derive(Clone, Copy)]
pub struct CredentialValidator<'a> {
    codec: &'a TokenCodec,
    revocations: &'a dyn RevocationStore,
    mode: ApiMode,
}

impl<'a> CredentialValidator<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            codec: &state.codec,
            revocations: state.revocations.as_ref(),
            mode: state.mode,
        }
    }

    pub async fn validate(
        &self,
        token: &str,
        observed_origin: &str,
    ) -> Result<AuthUser, AuthError> {
        let claims = self.codec.decode(token, ExpiryPolicy::Enforce)?;
        if matches!(claims, ClaimSet::Refresh(_)) {
            return Err(AuthError::WrongKind);
        }

        if let Some(jti) = claims.jti() {
            ensure_not_revoked(self.revocations, RevocationScope::Token, jti).await?;
        }
        ensure_not_revoked(self.revocations, RevocationScope::Session, claims.session_id()).await?;
        ensure_not_revoked(self.revocations, RevocationScope::User, claims.subject()).await?;

        if !origins_match(claims.origin(), observed_origin, self.mode) {
            debug!(claimed = claims.origin(), observed = observed_origin, "Origin mismatch");
            return Err(AuthError::OriginMismatch);
        }

        let principal = Principal::from_claims(&claims)?;
        Ok(AuthUser { principal, claims })
    }
}

/// Extractor for an authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub principal: Principal,
    pub claims: ClaimSet,
}

impl AuthUser {
    pub fn user_id(&self) -> &str {
        &self.principal.subject
    }
}

/// Counts the failure reason and converts it to the HTTP error.
pub fn reject(err: AuthError) -> AppError {
    track_validation_failure(err.reason());
    AppError::from(err)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(&parts.headers, &parts.uri)
            .ok_or(AuthError::MissingCredential)
            .map_err(reject)?;
        let origin = observed_origin(&parts.headers, &parts.uri);

        CredentialValidator::new(state)
            .validate(&token, &origin)
            .await
            .map_err(reject)
    }
}

/// The raw presented credential, not validated. Used by logout, which must
/// accept expired credentials.
#[derive(Debug, Clone)]
pub struct PresentedCredential(pub String);

impl<S: Send + Sync> FromRequestParts<S> for PresentedCredential {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_bearer(&parts.headers, &parts.uri)
            .map(PresentedCredential)
            .ok_or(AuthError::MissingCredential)
            .map_err(reject)
    }
}

/// The request's observed origin. Never fails.
#[derive(Debug, Clone)]
pub struct ObservedOrigin(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ObservedOrigin {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ObservedOrigin(observed_origin(&parts.headers, &parts.uri)))
    }
}
