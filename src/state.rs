use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use governor::DefaultKeyedRateLimiter;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, warn};

use tessera_auth::{TokenCodec, TokenIssuer};
use tessera_cache::{CacheConfig, OtpStore, RevocationStore, Stores, init_stores};
use tessera_config::{
    ApiMode, ConfigError, CorsConfig, JwtConfig, OtpConfig, RateLimitConfig, ServerConfig,
};
use tessera_core::hash_password;

use crate::modules::auth::otp::{OtpSender, TracingOtpSender};
use crate::modules::users::store::{MemoryUserStore, PgUserStore, UserStore};

const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Password verified when the account is unknown, so both paths pay for bcrypt.
const DECOY_PASSWORD: &str = "tessera-decoy-password";

/// Per-IP limiter for the credential-accepting endpoints.
#[derive(Clone)]
pub struct AuthRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    trusted_proxies: Arc<[IpAddr]>,
}

impl AuthRateLimiter {
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        config.auth_quota().map(|quota| Self {
            limiter: Arc::new(governor::RateLimiter::keyed(quota)),
            trusted_proxies: config.trusted_proxies.clone().into(),
        })
    }

    pub fn check(&self, ip: IpAddr) -> bool {
        self.limiter.check_key(&ip).is_ok()
    }

    pub fn trusted_proxies(&self) -> &[IpAddr] {
        &self.trusted_proxies
    }

    /// Drops buckets that have fully replenished.
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Prunes on a fixed interval for the life of the runtime.
    pub fn spawn_pruning(&self, every: Duration) {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                limiter.prune();
            }
        });
    }
}

impl std::fmt::Debug for AuthRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRateLimiter")
            .field("trusted_proxies", &self.trusted_proxies)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub mode: ApiMode,
    pub jwt_config: JwtConfig,
    pub otp_config: OtpConfig,
    pub cors_config: CorsConfig,
    pub codec: Arc<TokenCodec>,
    pub issuer: Arc<TokenIssuer>,
    pub revocations: Arc<dyn RevocationStore>,
    pub otp_store: Arc<dyn OtpStore>,
    pub otp_sender: Arc<dyn OtpSender>,
    pub users: Arc<dyn UserStore>,
    pub rate_limiter: Option<AuthRateLimiter>,
    pub decoy_password_hash: Arc<str>,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("mode", &self.mode)
            .field("jwt_config", &self.jwt_config)
            .field("otp_config", &self.otp_config)
            .field("revocations", &self.revocations)
            .field("otp_store", &self.otp_store)
            .field("users", &self.users)
            .field("rate_limiter", &self.rate_limiter)
            .field("metrics_enabled", &self.metrics_handle.is_some())
            .finish_non_exhaustive()
    }
}

/// Settings read from the environment and validated together.
#[derive(Clone, Debug)]
pub struct Settings {
    pub mode: ApiMode,
    pub jwt: JwtConfig,
    pub otp: OtpConfig,
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub cache: CacheConfig,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            mode: ApiMode::from_env()?,
            jwt: JwtConfig::from_env(),
            otp: OtpConfig::from_env(),
            server: ServerConfig::from_env(),
            cors: CorsConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            cache: CacheConfig::from_env(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate(self.mode)?;
        self.otp.validate()?;
        self.server.validate(self.mode)?;
        Ok(())
    }
}

impl AppState {
    /// Assembles state from already-built collaborators.
    pub fn build(
        settings: Settings,
        stores: Stores,
        users: Arc<dyn UserStore>,
        otp_sender: Arc<dyn OtpSender>,
        metrics_handle: Option<PrometheusHandle>,
    ) -> anyhow::Result<Self> {
        settings.validate()?;

        let codec = Arc::new(TokenCodec::from_config(&settings.jwt)?);
        let issuer = Arc::new(TokenIssuer::new(codec.clone(), &settings.jwt)?);
        let decoy_password_hash = hash_password(DECOY_PASSWORD, settings.server.bcrypt_cost)
            .map_err(|e| e.error)?;

        Ok(Self {
            mode: settings.mode,
            rate_limiter: AuthRateLimiter::from_config(&settings.rate_limit),
            jwt_config: settings.jwt,
            otp_config: settings.otp,
            cors_config: settings.cors,
            codec,
            issuer,
            revocations: stores.revocations,
            otp_store: stores.otp,
            otp_sender,
            users,
            decoy_password_hash: decoy_password_hash.into(),
            metrics_handle,
        })
    }
}

/// Builds the production state: Redis or memory stores, Postgres or memory users.
pub async fn init_app_state(
    settings: Settings,
    metrics_handle: Option<PrometheusHandle>,
) -> anyhow::Result<AppState> {
    settings.validate()?;

    if settings.jwt.secret.len() < 32 {
        warn!("JWT_SECRET_KEY is short or unset; using a development secret");
    }

    let stores = init_stores(&settings.cache).await;

    let users: Arc<dyn UserStore> = match settings.server.database_url.as_deref() {
        Some(url) => {
            info!("Connecting to Postgres user store");
            Arc::new(PgUserStore::connect(url).await?)
        }
        None => {
            warn!("DATABASE_URL not set, using an empty in-memory user store");
            Arc::new(MemoryUserStore::default())
        }
    };

    info!(
        mode = %settings.mode,
        cache_backend = stores.backend.as_str(),
        "Application state initialised"
    );

    let state = AppState::build(
        settings,
        stores,
        users,
        Arc::new(TracingOtpSender),
        metrics_handle,
    )?;

    if let Some(limiter) = &state.rate_limiter {
        limiter.spawn_pruning(RATE_LIMIT_PRUNE_INTERVAL);
    }

    Ok(state)
}
