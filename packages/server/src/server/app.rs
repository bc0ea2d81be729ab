//! Application setup and router construction.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::kernel::ServerDeps;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    health_handler, list_codes_handler, list_referrals_handler, me_handler,
    redeem_code_handler, referral_count_handler, send_otp_handler, set_name_handler,
    sync_codes_handler, verify_code_handler, verify_otp_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub deps: ServerDeps,
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}

/// Build the Axum application router
///
/// Rate limiting is layered on by the binary; see `middleware::with_rate_limit`.
pub fn build_app(deps: ServerDeps, allowed_origins: &[String]) -> Router {
    let jwt_service = deps.jwt_service.clone();
    let app_state = AxumAppState { deps };

    Router::new()
        .route("/health", get(health_handler))
        .route("/otp/send", post(send_otp_handler))
        .route("/otp/verify", post(verify_otp_handler))
        .route("/customer/name", post(set_name_handler))
        .route("/customer/me", get(me_handler))
        .route("/referrals", get(list_referrals_handler))
        .route("/referrals/count", get(referral_count_handler))
        .route("/redemption-codes", get(list_codes_handler))
        .route("/redemption-codes/verify", post(verify_code_handler))
        .route("/redemption-codes/redeem", post(redeem_code_handler))
        .route("/redemption-codes/sync", post(sync_codes_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(Arc::clone(&jwt_service), req, next)
        }))
        .layer(Extension(app_state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}
