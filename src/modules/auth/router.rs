use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::rate_limit::auth_rate_limit;
use crate::state::AppState;

use super::controller::{
    compare_token_info, login, login_with_otp, logout, me, refresh, send_otp, token_info,
    verify_otp,
};

pub fn init_auth_router(state: AppState) -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(login))
        .route("/login-with-otp", post(login_with_otp))
        .route("/refresh", post(refresh))
        .route("/send-otp", post(send_otp))
        .route("/verify-otp", post(verify_otp))
        .route_layer(middleware::from_fn_with_state(state, auth_rate_limit));

    Router::new()
        .merge(limited)
        .route("/logout", post(logout))
        .route("/token-info", get(token_info).post(compare_token_info))
        .route("/me", get(me))
}
