//! Revocation scopes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Granularity at which a revocation record is written.
///
/// `User` and `UserRefresh` are both keyed by the subject. `User` blankets every
/// credential the subject holds, `UserRefresh` only the refresh credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationScope {
    Token,
    Session,
    User,
    UserRefresh,
}

impl RevocationScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevocationScope::Token => "token",
            RevocationScope::Session => "session",
            RevocationScope::User => "user",
            RevocationScope::UserRefresh => "user_refresh",
        }
    }
}

impl fmt::Display for RevocationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
