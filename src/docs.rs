use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use tessera_auth::{CredentialKind, Principal};
use tessera_core::ErrorResponse;

use crate::modules::auth::model::{
    LoginRequest, LoginResponse, LogoutResponse, LogoutStatus, MessageResponse, OtpLoginRequest,
    RefreshRequest, SendOtpRequest, TokenInfoRequest,
};
use crate::modules::auth::otp::OtpChannel;
use crate::modules::auth::token_info::{
    ExtensionInfo, TokenConfiguration, TokenInfoResponse, TokenLifetime, TokenReport,
    TokenReportEntry,
};
use crate::modules::users::model::UserResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::login_with_otp,
        crate::modules::auth::controller::refresh,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::token_info,
        crate::modules::auth::controller::compare_token_info,
        crate::modules::auth::controller::send_otp,
        crate::modules::auth::controller::verify_otp,
        crate::modules::auth::controller::me,
    ),
    components(
        schemas(
            LoginRequest,
            OtpLoginRequest,
            SendOtpRequest,
            RefreshRequest,
            TokenInfoRequest,
            LoginResponse,
            LogoutResponse,
            LogoutStatus,
            MessageResponse,
            OtpChannel,
            UserResponse,
            Principal,
            CredentialKind,
            TokenInfoResponse,
            TokenReport,
            TokenReportEntry,
            TokenConfiguration,
            TokenLifetime,
            ExtensionInfo,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, session rotation, logout and OTP endpoints")
    ),
    info(
        title = "Tessera API",
        version = "0.1.0",
        description = "Session and token authentication service issuing access, session and refresh credentials with server-side revocation.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "session_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Session-Token"))),
            );
        }
    }
}
