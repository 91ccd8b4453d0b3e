use serde::Serialize;
use utoipa::ToSchema;

use tessera_core::AuthError;

use crate::claims::{ClaimSet, CredentialKind};

/// Validated identity of the caller for one request. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Principal {
    pub subject: String,
    pub kind: CredentialKind,
    pub session_id: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub permissions: Vec<String>,
    pub groups: Vec<String>,
}

impl Principal {
    /// Session credentials carry the full profile snapshot; access
    /// credentials only the status flags. Refresh credentials never
    /// authenticate a request.
    pub fn from_claims(claims: &ClaimSet) -> Result<Self, AuthError> {
        let header = claims.header();
        match claims {
            ClaimSet::Session(c) => Ok(Self {
                subject: header.sub.clone(),
                kind: CredentialKind::Session,
                session_id: header.session_id.clone(),
                is_active: c.profile.user_profile.is_active,
                is_verified: c.profile.user_profile.is_verified,
                permissions: c.profile.permissions.clone(),
                groups: c.profile.groups.clone(),
            }),
            ClaimSet::Access(c) => Ok(Self {
                subject: header.sub.clone(),
                kind: CredentialKind::Access,
                session_id: header.session_id.clone(),
                is_active: c.status.is_active,
                is_verified: c.status.is_verified,
                permissions: Vec::new(),
                groups: Vec::new(),
            }),
            ClaimSet::Refresh(_) => Err(AuthError::WrongKind),
        }
    }
}
