use axum::{
    Router,
    routing::{patch, post, put},
};
use lms_config::RateLimitConfig;
use std::sync::Arc;
use tower_governor::GovernorLayer;

use crate::state::AppState;

use super::controller::{get_access_token, sign_in, sign_up};

pub fn init_auth_router(rate_limit: &RateLimitConfig) -> Router<AppState> {
    let router = Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", put(sign_in))
        .route("/get-access-token", patch(get_access_token));

    match rate_limit.auth_governor_config() {
        Some(config) => router.layer(GovernorLayer::new(Arc::new(config))),
        None => router,
    }
}
