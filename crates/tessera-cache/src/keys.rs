//! Cache key generation.
//!
//! ```text
//! {prefix}:revoked:token:{sha256(jti)}
//! {prefix}:revoked:session:{session_id}
//! {prefix}:revoked:user:{subject}
//! {prefix}:revoked:user_refresh:{subject}
//! {prefix}:otp:{identifier}
//! ```

use sha2::{Digest, Sha256};

use tessera_core::RevocationScope;

#[derive(Clone, Debug)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn build_key(&self, parts: &[&str]) -> String {
        format!("{}:{}", self.prefix, parts.join(":"))
    }

    /// Token ids are hashed so raw `jti` values never land in the store.
    pub fn revocation(&self, scope: RevocationScope, key: &str) -> String {
        match scope {
            RevocationScope::Token => {
                self.build_key(&["revoked", scope.as_str(), &hash_token_id(key)])
            }
            _ => self.build_key(&["revoked", scope.as_str(), key]),
        }
    }

    pub fn otp(&self, identifier: &str) -> String {
        self.build_key(&["otp", identifier])
    }
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self::new("tessera")
    }
}

/// Lowercase hex SHA-256.
pub fn hash_token_id(jti: &str) -> String {
    hex::encode(Sha256::digest(jti.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_keys_are_hashed() {
        let keys = CacheKeys::new("tessera");
        let key = keys.revocation(RevocationScope::Token, "jti-1");

        assert!(key.starts_with("tessera:revoked:token:"));
        assert!(!key.contains("jti-1"));
        assert_eq!(key.rsplit(':').next().unwrap().len(), 64);
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(
            hash_token_id("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_user_scopes_use_distinct_namespaces() {
        let keys = CacheKeys::new("app");
        assert_eq!(keys.revocation(RevocationScope::User, "u1"), "app:revoked:user:u1");
        assert_eq!(
            keys.revocation(RevocationScope::UserRefresh, "u1"),
            "app:revoked:user_refresh:u1"
        );
        assert_eq!(
            keys.revocation(RevocationScope::Session, "s1"),
            "app:revoked:session:s1"
        );
    }

    #[test]
    fn test_otp_key() {
        assert_eq!(CacheKeys::default().otp("email:a@b.c"), "tessera:otp:email:a@b.c");
    }
}
