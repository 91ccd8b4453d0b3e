/// Configuration problems detected at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("API_MODE `{0}` is not recognised (expected development or production)")]
    InvalidMode(String),

    #[error("unsupported signing algorithm `{0}` (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),

    #[error("credential lifetimes must satisfy 0 < access < session < refresh (got {access}/{session}/{refresh} minutes)")]
    ExpiryOrdering {
        access: u64,
        session: u64,
        refresh: u64,
    },

    #[error("logout revocation TTL ({ttl_seconds}s) must outlive the access token lifetime ({access_seconds}s)")]
    RevocationTtlTooShort { ttl_seconds: u64, access_seconds: u64 },

    #[error("JWT_SECRET_KEY must be set to at least 32 bytes in production")]
    WeakSecret,

    #[error("DATABASE_URL must be set in production")]
    MissingDatabaseUrl,

    #[error("OTP length must be between 4 and 10 digits (got {0})")]
    OtpLength(usize),

    #[error("BCRYPT_COST must be between 4 and 31 (got {0})")]
    BcryptCost(u32),
}
