//! Authentication and authorization failures.
//!
//! Every variant except [`AuthError::Signing`] reaches the caller as a plain
//! `401 Unauthorized`. The variants stay distinct internally so logs and metrics
//! can tell a revoked session from an expired token.

use crate::revocation::RevocationScope;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no credential was presented")]
    MissingCredential,

    #[error("token is malformed")]
    MalformedToken,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("credential kind is not accepted here")]
    WrongKind,

    #[error("credential revoked at {0} scope")]
    Revoked(RevocationScope),

    #[error("token origin does not match the request origin")]
    OriginMismatch,

    #[error("account is not active")]
    AccountInactive,

    #[error("account is not verified")]
    AccountUnverified,

    #[error("account not found")]
    AccountNotFound,

    #[error("submitted secret does not match")]
    CredentialMismatch,

    #[error("revocation store is unavailable")]
    StoreUnavailable,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl AuthError {
    /// Stable label used for log fields and metric labels.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::MalformedToken => "malformed_token",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::Expired => "expired",
            AuthError::WrongKind => "wrong_kind",
            AuthError::Revoked(RevocationScope::Token) => "revoked_token",
            AuthError::Revoked(RevocationScope::Session) => "revoked_session",
            AuthError::Revoked(RevocationScope::User) => "revoked_user",
            AuthError::Revoked(RevocationScope::UserRefresh) => "revoked_user_refresh",
            AuthError::OriginMismatch => "origin_mismatch",
            AuthError::AccountInactive => "account_inactive",
            AuthError::AccountUnverified => "account_unverified",
            AuthError::AccountNotFound => "account_not_found",
            AuthError::CredentialMismatch => "credential_mismatch",
            AuthError::StoreUnavailable => "store_unavailable",
            AuthError::Signing(_) => "signing",
        }
    }

    /// Whether the failure is the caller's (401) rather than the server's (500).
    pub fn is_unauthorized(&self) -> bool {
        !matches!(self, AuthError::Signing(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_labels_are_distinct_per_scope() {
        assert_eq!(
            AuthError::Revoked(RevocationScope::Session).reason(),
            "revoked_session"
        );
        assert_eq!(AuthError::Revoked(RevocationScope::User).reason(), "revoked_user");
    }

    #[test]
    fn test_signing_is_not_unauthorized() {
        assert!(!AuthError::Signing("boom".into()).is_unauthorized());
        assert!(AuthError::StoreUnavailable.is_unauthorized());
        assert!(AuthError::OriginMismatch.is_unauthorized());
    }
}
