//! Signing and verification of bearer credentials.
//!
//! [`TokenCodec`] turns a [`ClaimSet`] into a compact HMAC-signed JWT and back.
//! Decoding always checks the signature first; expiry is checked according to
//! an explicit [`ExpiryPolicy`].
//!
//! # Example
//!
//! ```ignore
//! use tessera_auth::{ExpiryPolicy, TokenCodec};
//! use tessera_config::JwtConfig;
//!
//! let codec = TokenCodec::from_config(&JwtConfig::from_env())?;
//! let token = codec.encode(&claims)?;
//! let decoded = codec.decode(&token, ExpiryPolicy::Enforce)?;
//! ```

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use tessera_config::{ConfigError, JwtConfig};
use tessera_core::AuthError;

use crate::claims::ClaimSet;

/// Whether `decode` rejects credentials past their `exp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    Enforce,
    /// Signature is still verified. Only logout decodes this way, so that an
    /// expired credential can still be identified and revoked.
    Ignore,
}

#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    leeway_seconds: u64,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], algorithm: Algorithm, leeway_seconds: u64) -> Self {
        Self {
            algorithm,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            leeway_seconds,
        }
    }

    /// Builds a codec from configuration. Only HMAC algorithms are accepted.
    pub fn from_config(config: &JwtConfig) -> Result<Self, ConfigError> {
        let algorithm = match config.algorithm.as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => return Err(ConfigError::UnsupportedAlgorithm(other.to_string())),
        };

        Ok(Self::new(
            config.secret.as_bytes(),
            algorithm,
            config.leeway_seconds,
        ))
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn encode(&self, claims: &ClaimSet) -> Result<String, AuthError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn decode(&self, token: &str, policy: ExpiryPolicy) -> Result<ClaimSet, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = self.leeway_seconds;
        validation.validate_exp = policy == ExpiryPolicy::Enforce;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<ClaimSet>(token.trim(), &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(map_decode_error)?;

        let header = claims.header();
        if header.exp <= header.iat {
            return Err(AuthError::MalformedToken);
        }

        Ok(claims)
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::SignatureInvalid,
        _ => AuthError::MalformedToken,
    }
}
