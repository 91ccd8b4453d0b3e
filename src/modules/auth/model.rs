use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::modules::users::model::UserResponse;

use super::otp::OtpChannel;

/// Password login. `username` is an email address or phone number.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// OTP login, also used to verify a contact channel without logging in.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OtpLoginRequest {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
    pub channel: Option<OtpChannel>,
    #[validate(length(min = 4, max = 10, message = "otp must be 4 to 10 digits"))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendOtpRequest {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
    pub channel: OtpChannel,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogoutParams {
    /// Revoke every session of the user (default: true).
    pub all_devices: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct TokenInfoRequest {
    pub access_token: Option<String>,
    pub session_token: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub session_token: String,
    pub session_id: String,
    /// Always `bearer`.
    pub token_type: String,
    pub user: UserResponse,
}

/// Outcome of each logout write: `true` written, `false` failed, `null` skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct LogoutStatus {
    pub token_revoked: Option<bool>,
    pub refresh_tokens_revoked: Option<bool>,
    pub sessions_revoked: Option<bool>,
    pub all_succeeded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
    pub status: LogoutStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_login_channel_is_optional() {
        let req: OtpLoginRequest =
            serde_json::from_str(r#"{"user_id":"ada@example.com","otp":"123456"}"#).unwrap();
        assert!(req.channel.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_short_otp_fails_validation() {
        let req: OtpLoginRequest =
            serde_json::from_str(r#"{"user_id":"ada@example.com","otp":"12"}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_logout_status_serializes_skipped_as_null() {
        let status = LogoutStatus {
            token_revoked: Some(true),
            refresh_tokens_revoked: Some(false),
            sessions_revoked: None,
            all_succeeded: false,
        };
        let value = serde_json::to_value(status).unwrap();
        assert_eq!(value["token_revoked"], true);
        assert_eq!(value["refresh_tokens_revoked"], false);
        assert!(value["sessions_revoked"].is_null());
    }
}
