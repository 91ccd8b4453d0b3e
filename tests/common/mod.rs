#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use tessera::modules::auth::otp::TracingOtpSender;
use tessera::modules::users::model::UserRecord;
use tessera::modules::users::store::MemoryUserStore;
use tessera::router::init_router;
use tessera::state::{AppState, Settings};
use tessera_cache::{CacheConfig, CacheError, CacheKeys, MemoryCache, RevocationStore, Stores};
use tessera_config::{
    ApiMode, CorsConfig, JwtConfig, OtpConfig, RateLimitConfig, ServerConfig,
};
use tessera_core::{RevocationScope, hash_password};

pub const PASSWORD: &str = "correct-horse-battery";
pub const ORIGIN: &str = "https://app.example.com";
pub const MASTER_OTP: &str = "424242";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub users: Arc<MemoryUserStore>,
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn settings(mode: ApiMode) -> Settings {
    Settings {
        mode,
        jwt: JwtConfig {
            secret: "integration-test-secret-of-at-least-32-bytes".to_string(),
            ..JwtConfig::default()
        },
        otp: OtpConfig {
            master_code: Some(MASTER_OTP.to_string()),
            ..OtpConfig::default()
        },
        server: ServerConfig {
            database_url: Some("postgres://unused".to_string()),
            bcrypt_cost: 4,
            metrics_enabled: false,
            ..ServerConfig::default()
        },
        cors: CorsConfig::default(),
        rate_limit: RateLimitConfig::disabled(),
        cache: CacheConfig::memory_only(),
    }
}

/// An active, verified account with [`PASSWORD`].
pub fn active_user() -> UserRecord {
    UserRecord {
        user_id: Uuid::new_v4(),
        email: Some(SafeEmail().fake()),
        phone_number: Some(format!("+23480{}", (10_000_000..99_999_999).fake::<u32>())),
        user_name: None,
        first_name: Some(FirstName().fake()),
        last_name: Some(LastName().fake()),
        language: Some("en".to_string()),
        password_hash: Some(hash_password(PASSWORD, 4).unwrap()),
        is_active: true,
        is_verified: true,
        is_email_verified: false,
        is_phone_verified: false,
        permissions: vec!["view_profile".to_string(), "edit_profile".to_string()],
        groups: vec!["members".to_string()],
        last_sign_in_at: None,
    }
}

pub fn spawn_app_with(settings: Settings, users: Vec<UserRecord>) -> TestApp {
    let stores = Stores::memory(&settings.cache);
    spawn_app_with_stores(settings, users, stores)
}

/// Like [`spawn_app`], with revocations served by `revocations`.
pub fn spawn_app_with_revocations(
    users: Vec<UserRecord>,
    revocations: Arc<dyn RevocationStore>,
) -> TestApp {
    let settings = settings(ApiMode::Development);
    let mut stores = Stores::memory(&settings.cache);
    stores.revocations = revocations;
    spawn_app_with_stores(settings, users, stores)
}

pub fn spawn_app_with_stores(settings: Settings, users: Vec<UserRecord>, stores: Stores) -> TestApp {
    let user_store = Arc::new(MemoryUserStore::new(users));

    let state = AppState::build(
        settings,
        stores,
        user_store.clone(),
        Arc::new(TracingOtpSender),
        None,
    )
    .unwrap();

    TestApp {
        router: init_router(state.clone()),
        state,
        users: user_store,
    }
}

pub fn spawn_app(users: Vec<UserRecord>) -> TestApp {
    spawn_app_with(settings(ApiMode::Development), users)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("origin", ORIGIN)
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("origin", ORIGIN)
        .body(Body::empty())
        .unwrap()
}

pub fn post_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("origin", ORIGIN)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Logs in with [`PASSWORD`] and returns the login response body.
pub async fn login(app: &TestApp, username: &str) -> Value {
    let response = app
        .send(post_json(
            "/api/auth/login",
            serde_json::json!({ "username": username, "password": PASSWORD }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

pub fn token<'a>(body: &'a Value, field: &str) -> &'a str {
    body[field].as_str().unwrap()
}

/// Revocation store over [`MemoryCache`] that can fail or stall on demand.
#[derive(Debug)]
pub struct FlakyRevocations {
    inner: MemoryCache,
    fail_reads: AtomicBool,
    failing_writes: Mutex<Vec<RevocationScope>>,
    read_delay: Option<Duration>,
}

impl FlakyRevocations {
    pub fn new() -> Self {
        Self {
            inner: MemoryCache::new(CacheKeys::new("test")),
            fail_reads: AtomicBool::new(false),
            failing_writes: Mutex::new(Vec::new()),
            read_delay: None,
        }
    }

    /// Every lookup sleeps for `delay` before answering.
    pub fn with_read_delay(delay: Duration) -> Self {
        Self {
            read_delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes_in(&self, scope: RevocationScope) {
        self.failing_writes.lock().unwrap().push(scope);
    }

    pub fn heal_writes(&self) {
        self.failing_writes.lock().unwrap().clear();
    }

    fn write_fails(&self, scope: RevocationScope) -> bool {
        self.failing_writes.lock().unwrap().contains(&scope)
    }

    fn outage() -> CacheError {
        CacheError::Timeout(Duration::from_millis(250))
    }
}

#[async_trait]
impl RevocationStore for FlakyRevocations {
    async fn mark(
        &self,
        scope: RevocationScope,
        key: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        if self.write_fails(scope) {
            return Err(Self::outage());
        }
        self.inner.mark(scope, key, ttl).await
    }

    async fn claim(
        &self,
        scope: RevocationScope,
        key: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        if self.write_fails(scope) {
            return Err(Self::outage());
        }
        self.inner.claim(scope, key, ttl).await
    }

    async fn is_marked(&self, scope: RevocationScope, key: &str) -> Result<bool, CacheError> {
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.is_marked(scope, key).await
    }

    async fn clear(&self, scope: RevocationScope, key: &str) -> Result<(), CacheError> {
        self.inner.clear(scope, key).await
    }
}
