//! User records as the auth flows see them.
//!
//! Account management lives outside this service; the auth core only reads
//! status flags, the password hash and the opaque permission and group names,
//! and writes back channel verification and last sign-in time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use tessera_auth::{AccountStatus, ProfileSnapshot, UserProfile};

#[derive(FromRow, Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_email_verified: bool,
    pub is_phone_verified: bool,
    pub permissions: Vec<String>,
    pub groups: Vec<String>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

/// Contact channel whose ownership an OTP proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactChannel {
    Email,
    Phone,
}

impl UserRecord {
    pub fn status(&self) -> AccountStatus {
        AccountStatus {
            is_active: self.is_active,
            is_verified: self.is_verified,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.user_id.to_string(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            user_name: self.user_name.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            language: self.language.clone(),
            is_active: self.is_active,
            is_verified: self.is_verified,
        }
    }

    pub fn profile_snapshot(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            user_profile: self.profile(),
            permissions: self.permissions.clone(),
            groups: self.groups.clone(),
        }
    }

    pub fn mark_verified(&mut self, channel: ContactChannel) {
        match channel {
            ContactChannel::Email => self.is_email_verified = true,
            ContactChannel::Phone => self.is_phone_verified = true,
        }
    }

    /// Case-insensitive on email, exact on phone number.
    pub fn matches_login(&self, identifier: &str) -> bool {
        let identifier = identifier.trim();
        self.email
            .as_deref()
            .is_some_and(|email| email.eq_ignore_ascii_case(identifier))
            || self.phone_number.as_deref() == Some(identifier)
    }
}

/// Public view of an account returned with a login.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_email_verified: bool,
    pub is_phone_verified: bool,
    pub permissions: Vec<String>,
    pub groups: Vec<String>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            phone_number: user.phone_number,
            user_name: user.user_name,
            first_name: user.first_name,
            last_name: user.last_name,
            language: user.language,
            is_active: user.is_active,
            is_verified: user.is_verified,
            is_email_verified: user.is_email_verified,
            is_phone_verified: user.is_phone_verified,
            permissions: user.permissions,
            groups: user.groups,
            last_sign_in_at: user.last_sign_in_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserRecord {
        UserRecord {
            user_id: Uuid::new_v4(),
            email: Some("Ada@Example.com".to_string()),
            phone_number: Some("+2348000000000".to_string()),
            user_name: Some("ada".to_string()),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            language: None,
            password_hash: Some("hash".to_string()),
            is_active: true,
            is_verified: false,
            is_email_verified: false,
            is_phone_verified: false,
            permissions: vec!["view_profile".to_string()],
            groups: vec!["staff".to_string()],
            last_sign_in_at: None,
        }
    }

    #[test]
    fn test_matches_login_by_email_or_phone() {
        let user = user();
        assert!(user.matches_login("ada@example.com"));
        assert!(user.matches_login(" +2348000000000 "));
        assert!(!user.matches_login("grace@example.com"));
    }

    #[test]
    fn test_profile_snapshot_carries_flags_and_names() {
        let user = user();
        let snapshot = user.profile_snapshot();

        assert_eq!(snapshot.user_profile.user_id, user.user_id.to_string());
        assert!(snapshot.user_profile.is_active);
        assert!(!snapshot.user_profile.is_verified);
        assert_eq!(snapshot.permissions, vec!["view_profile".to_string()]);
        assert_eq!(snapshot.status(), user.status());
    }

    #[test]
    fn test_response_omits_password_hash() {
        let value = serde_json::to_value(UserResponse::from(user())).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["user_name"], "ada");
    }
}
