//! Claim structures carried by the three credential kinds.
//!
//! Every credential shares a [`ClaimHeader`]. The `type` field of the JSON payload
//! selects the variant of [`ClaimSet`], so kind-specific fields only exist on the
//! kind that carries them:
//!
//! | kind      | extra payload                              |
//! |-----------|--------------------------------------------|
//! | `access`  | `jti`, `is_active`, `is_verified`          |
//! | `session` | `user_profile`, `permissions`, `groups`    |
//! | `refresh` | nothing                                    |

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    Access,
    Session,
    Refresh,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Access => "access",
            CredentialKind::Session => "session",
            CredentialKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields shared by every credential of a triad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimHeader {
    /// Subject (user ID).
    pub sub: String,
    pub session_id: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
    /// Client origin observed when the triad was issued.
    pub origin: String,
}

/// Account flags carried by access credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountStatus {
    pub is_active: bool,
    pub is_verified: bool,
}

/// Display attributes and status flags captured into a session credential.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub user_id: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
}

/// Denormalized account view embedded in session credentials so that
/// validating one needs no user lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub user_profile: UserProfile,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl ProfileSnapshot {
    pub fn status(&self) -> AccountStatus {
        AccountStatus {
            is_active: self.user_profile.is_active,
            is_verified: self.user_profile.is_verified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(flatten)]
    pub header: ClaimHeader,
    /// Unique token ID, the revocation key for this single credential.
    pub jti: String,
    #[serde(flatten)]
    pub status: AccountStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(flatten)]
    pub header: ClaimHeader,
    #[serde(flatten)]
    pub profile: ProfileSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    #[serde(flatten)]
    pub header: ClaimHeader,
}

/// Decoded payload of any credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClaimSet {
    Access(AccessClaims),
    Session(SessionClaims),
    Refresh(RefreshClaims),
}

impl ClaimSet {
    pub fn header(&self) -> &ClaimHeader {
        match self {
            ClaimSet::Access(c) => &c.header,
            ClaimSet::Session(c) => &c.header,
            ClaimSet::Refresh(c) => &c.header,
        }
    }

    pub fn kind(&self) -> CredentialKind {
        match self {
            ClaimSet::Access(_) => CredentialKind::Access,
            ClaimSet::Session(_) => CredentialKind::Session,
            ClaimSet::Refresh(_) => CredentialKind::Refresh,
        }
    }

    pub fn subject(&self) -> &str {
        &self.header().sub
    }

    pub fn session_id(&self) -> &str {
        &self.header().session_id
    }

    pub fn origin(&self) -> &str {
        &self.header().origin
    }

    /// The unique token ID. Only access credentials carry one.
    pub fn jti(&self) -> Option<&str> {
        match self {
            ClaimSet::Access(c) => Some(&c.jti),
            _ => None,
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.header().iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.header().exp, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn header() -> ClaimHeader {
        ClaimHeader {
            sub: "user-1".to_string(),
            session_id: "session-1".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
            origin: "https://app.example.com".to_string(),
        }
    }

    #[test]
    fn test_access_claims_wire_format() {
        let claims = ClaimSet::Access(AccessClaims {
            header: header(),
            jti: "jti-1".to_string(),
            status: AccountStatus {
                is_active: true,
                is_verified: false,
            },
        });

        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "access",
                "sub": "user-1",
                "session_id": "session-1",
                "iat": 1_700_000_000,
                "exp": 1_700_003_600,
                "origin": "https://app.example.com",
                "jti": "jti-1",
                "is_active": true,
                "is_verified": false,
            })
        );
    }

    #[test]
    fn test_refresh_claims_are_minimal() {
        let claims = ClaimSet::Refresh(RefreshClaims { header: header() });
        let value = serde_json::to_value(&claims).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 6);
        assert_eq!(value["type"], "refresh");
        assert!(object.get("jti").is_none());
    }

    #[test]
    fn test_session_claims_carry_profile() {
        let claims = ClaimSet::Session(SessionClaims {
            header: header(),
            profile: ProfileSnapshot {
                user_profile: UserProfile {
                    user_id: "user-1".to_string(),
                    email: Some("ada@example.com".to_string()),
                    is_active: true,
                    is_verified: true,
                    ..UserProfile::default()
                },
                permissions: vec!["view_profile".to_string()],
                groups: vec!["staff".to_string()],
            },
        });

        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["type"], "session");
        assert_eq!(value["user_profile"]["email"], "ada@example.com");
        assert_eq!(value["permissions"], json!(["view_profile"]));
        assert_eq!(value["groups"], json!(["staff"]));

        let back: ClaimSet = serde_json::from_value(value).unwrap();
        assert_eq!(back, claims);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let value = json!({
            "type": "mfa",
            "sub": "user-1",
            "session_id": "s",
            "iat": 1,
            "exp": 2,
            "origin": "o",
        });
        assert!(serde_json::from_value::<ClaimSet>(value).is_err());
    }

    #[test]
    fn test_accessors() {
        let claims = ClaimSet::Refresh(RefreshClaims { header: header() });
        assert_eq!(claims.kind(), CredentialKind::Refresh);
        assert_eq!(claims.subject(), "user-1");
        assert_eq!(claims.session_id(), "session-1");
        assert_eq!(claims.jti(), None);
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_700_003_600);
    }
}
