use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use tessera_auth::{ClaimSet, ExpiryPolicy, TokenTriad, new_session_id, origins_match};
use tessera_cache::RevocationStore;
use tessera_core::{AppError, AuthError, RevocationScope, verify_password};

use crate::metrics::{track_login, track_logout, track_refresh, track_store_error, track_tokens_issued};
use crate::middleware::auth::{AuthUser, ensure_not_revoked, reject};
use crate::modules::users::model::UserRecord;
use crate::state::AppState;

use super::model::{
    LoginRequest, LoginResponse, LogoutResponse, LogoutStatus, MessageResponse, OtpLoginRequest,
    RefreshRequest, SendOtpRequest, TokenInfoRequest,
};
use super::otp::{self, OtpChannel, OtpPurpose};
use super::token_info::{SuppliedTokens, TokenInfoResponse, build_token_info};

pub struct AuthService;

fn ensure_account_usable(user: &UserRecord) -> Result<(), AuthError> {
    if !user.is_active {
        return Err(AuthError::AccountInactive);
    }
    if !user.is_verified {
        return Err(AuthError::AccountUnverified);
    }
    Ok(())
}

fn login_response(triad: TokenTriad, user: UserRecord) -> LoginResponse {
    LoginResponse {
        access_token: triad.access_token,
        refresh_token: triad.refresh_token,
        session_token: triad.session_token,
        session_id: triad.session_id,
        token_type: "bearer".to_string(),
        user: user.into(),
    }
}

/// Writes one revocation record, logging instead of failing.
async fn record_revocation(
    revocations: &dyn RevocationStore,
    scope: RevocationScope,
    key: &str,
    ttl: Duration,
) -> bool {
    match revocations.mark(scope, key, ttl).await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, scope = %scope, "Failed to record revocation");
            track_store_error("write");
            false
        }
    }
}

impl AuthService {
    #[instrument(skip(state, dto), fields(username = %dto.username))]
    pub async fn login_with_password(
        state: &AppState,
        dto: LoginRequest,
        origin: &str,
    ) -> Result<LoginResponse, AppError> {
        let result = Self::password_login(state, dto, origin).await;
        track_login("password", result.is_ok());
        result
    }

    async fn password_login(
        state: &AppState,
        dto: LoginRequest,
        origin: &str,
    ) -> Result<LoginResponse, AppError> {
        let user = state.users.find_by_login(&dto.username).await?;

        // Unknown accounts still pay for a bcrypt check so timing does not
        // reveal which usernames exist.
        let hash = user
            .as_ref()
            .and_then(|u| u.password_hash.clone())
            .unwrap_or_else(|| state.decoy_password_hash.to_string());
        let password = dto.password;
        let is_valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(AppError::internal)??;

        let user = match user {
            Some(user) if is_valid && user.password_hash.is_some() => user,
            _ => return Err(reject(AuthError::CredentialMismatch)),
        };
        ensure_account_usable(&user).map_err(reject)?;

        Self::establish_session(state, user, origin).await
    }

    #[instrument(skip(state, dto), fields(user_id = %dto.user_id))]
    pub async fn login_with_otp(
        state: &AppState,
        dto: OtpLoginRequest,
        origin: &str,
    ) -> Result<LoginResponse, AppError> {
        let result = Self::otp_login(state, dto, origin).await;
        track_login("otp", result.is_ok());
        result
    }

    async fn otp_login(
        state: &AppState,
        dto: OtpLoginRequest,
        origin: &str,
    ) -> Result<LoginResponse, AppError> {
        let identifier = dto.user_id.trim();
        let mut user = state
            .users
            .find_by_login(identifier)
            .await?
            .ok_or(AuthError::AccountNotFound)
            .map_err(reject)?;
        ensure_account_usable(&user).map_err(reject)?;

        otp::verify_otp(state, identifier, &dto.otp, OtpPurpose::Login)
            .await
            .map_err(reject)?;

        let channel = dto
            .channel
            .unwrap_or_else(|| OtpChannel::for_identifier(identifier))
            .contact_channel();
        state
            .users
            .mark_channel_verified(user.user_id, channel)
            .await?;
        user.mark_verified(channel);

        Self::establish_session(state, user, origin).await
    }

    /// Lifts user-wide revocations and issues a triad under a new session id.
    async fn establish_session(
        state: &AppState,
        mut user: UserRecord,
        origin: &str,
    ) -> Result<LoginResponse, AppError> {
        let subject = user.user_id.to_string();

        for scope in [RevocationScope::User, RevocationScope::UserRefresh] {
            if let Err(e) = state.revocations.clear(scope, &subject).await {
                warn!(error = %e, scope = %scope, "Could not clear user revocation on login");
                track_store_error("clear");
            }
        }

        let session_id = new_session_id();
        let triad = state.issuer.issue_triad(
            &subject,
            origin,
            &user.profile_snapshot(),
            user.status(),
            &session_id,
        )?;
        track_tokens_issued();

        if let Err(e) = state.users.touch_last_sign_in(user.user_id).await {
            warn!(error = %e, "Could not record last sign-in");
        } else {
            user.last_sign_in_at = Some(Utc::now());
        }

        info!(user_id = %subject, session_id = %session_id, "Session established");
        Ok(login_response(triad, user))
    }

    #[instrument(skip_all)]
    pub async fn refresh(
        state: &AppState,
        dto: RefreshRequest,
        origin: &str,
    ) -> Result<LoginResponse, AppError> {
        let result = Self::rotate(state, &dto.refresh_token, origin).await;
        track_refresh(result.is_ok());
        result
    }

    async fn rotate(state: &AppState, token: &str, origin: &str) -> Result<LoginResponse, AppError> {
        let claims = state
            .codec
            .decode(token, ExpiryPolicy::Enforce)
            .map_err(reject)?;
        if !matches!(claims, ClaimSet::Refresh(_)) {
            return Err(reject(AuthError::WrongKind));
        }

        let revocations = state.revocations.as_ref();
        let subject = claims.subject();
        let old_session = claims.session_id();

        ensure_not_revoked(revocations, RevocationScope::UserRefresh, subject)
            .await
            .map_err(reject)?;
        ensure_not_revoked(revocations, RevocationScope::Session, old_session)
            .await
            .map_err(reject)?;
        ensure_not_revoked(revocations, RevocationScope::User, subject)
            .await
            .map_err(reject)?;

        if !origins_match(claims.origin(), origin, state.mode) {
            return Err(reject(AuthError::OriginMismatch));
        }

        let user = state
            .users
            .find_by_id(subject)
            .await?
            .ok_or(AuthError::AccountNotFound)
            .map_err(reject)?;
        ensure_account_usable(&user).map_err(reject)?;

        // Only the first rotation of a session may mint a new triad.
        match revocations
            .claim(
                RevocationScope::Session,
                old_session,
                state.jwt_config.refresh_token_ttl(),
            )
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(session_id = %old_session, "Refresh token already rotated");
                return Err(reject(AuthError::Revoked(RevocationScope::Session)));
            }
            Err(e) => {
                error!(error = %e, "Could not revoke rotated session");
                track_store_error("write");
                return Err(reject(AuthError::StoreUnavailable));
            }
        }

        let session_id = new_session_id();
        let triad = state.issuer.issue_triad(
            subject,
            claims.origin(),
            &user.profile_snapshot(),
            user.status(),
            &session_id,
        )?;
        track_tokens_issued();

        info!(user_id = %subject, old_session_id = %old_session, session_id = %session_id, "Session rotated");
        Ok(login_response(triad, user))
    }

    /// Records revocations for the presented credential. Expired credentials
    /// are accepted; store failures are reported, never raised.
    #[instrument(skip(state, token))]
    pub async fn logout(
        state: &AppState,
        token: &str,
        all_devices: bool,
    ) -> Result<LogoutResponse, AppError> {
        let claims = state
            .codec
            .decode(token, ExpiryPolicy::Ignore)
            .map_err(reject)?;

        let revocations = state.revocations.as_ref();
        let refresh_ttl = state.jwt_config.refresh_token_ttl();
        let subject = claims.subject();

        let token_revoked = match claims.jti() {
            Some(jti) => {
                record_revocation(
                    revocations,
                    RevocationScope::Token,
                    jti,
                    state.jwt_config.logout_revocation_ttl(),
                )
                .await
            }
            None => {
                record_revocation(
                    revocations,
                    RevocationScope::Session,
                    claims.session_id(),
                    refresh_ttl,
                )
                .await
            }
        };

        let refresh_tokens_revoked =
            record_revocation(revocations, RevocationScope::UserRefresh, subject, refresh_ttl)
                .await;

        let sessions_revoked = if all_devices {
            Some(record_revocation(revocations, RevocationScope::User, subject, refresh_ttl).await)
        } else {
            None
        };

        let all_succeeded =
            token_revoked && refresh_tokens_revoked && sessions_revoked.unwrap_or(true);
        track_logout(all_devices);

        info!(
            user_id = %subject,
            session_id = %claims.session_id(),
            all_devices,
            all_succeeded,
            "Logged out"
        );

        let message = if all_succeeded {
            "Logged out successfully"
        } else {
            "Logged out, but some revocations could not be recorded"
        };

        Ok(LogoutResponse {
            message: message.to_string(),
            status: LogoutStatus {
                token_revoked: Some(token_revoked),
                refresh_tokens_revoked: Some(refresh_tokens_revoked),
                sessions_revoked,
                all_succeeded,
            },
        })
    }

    pub fn token_info(
        state: &AppState,
        auth_user: &AuthUser,
        supplied: Option<&TokenInfoRequest>,
    ) -> TokenInfoResponse {
        let supplied = supplied
            .map(|req| SuppliedTokens {
                access_token: req.access_token.as_deref(),
                session_token: req.session_token.as_deref(),
                refresh_token: req.refresh_token.as_deref(),
            })
            .unwrap_or_default();

        build_token_info(
            &auth_user.claims,
            supplied,
            &state.codec,
            &state.jwt_config,
            Utc::now(),
        )
    }

    #[instrument(skip(state, dto), fields(user_id = %dto.user_id, channel = dto.channel.as_str()))]
    pub async fn send_otp(state: &AppState, dto: SendOtpRequest) -> Result<MessageResponse, AppError> {
        otp::issue_otp(state, &dto.user_id, dto.channel).await?;
        Ok(MessageResponse::new("OTP sent successfully"))
    }

    /// Verifies a contact channel with an OTP without consuming it.
    #[instrument(skip(state, dto), fields(user_id = %dto.user_id))]
    pub async fn verify_otp(
        state: &AppState,
        dto: OtpLoginRequest,
    ) -> Result<MessageResponse, AppError> {
        let identifier = dto.user_id.trim();
        otp::verify_otp(state, identifier, &dto.otp, OtpPurpose::Verification)
            .await
            .map_err(reject)?;

        let user = state
            .users
            .find_by_login(identifier)
            .await?
            .ok_or(AuthError::AccountNotFound)
            .map_err(reject)?;

        let channel = dto
            .channel
            .unwrap_or_else(|| OtpChannel::for_identifier(identifier));
        state
            .users
            .mark_channel_verified(user.user_id, channel.contact_channel())
            .await?;

        let message = match channel {
            OtpChannel::Email => "Email verified successfully",
            OtpChannel::Sms | OtpChannel::Whatsapp => "Phone number verified successfully",
        };
        Ok(MessageResponse::new(message))
    }
}
