// Rate limiting using tower-governor
//
// 10 requests per second per client IP with bursts of 20. The client IP
// comes from X-Forwarded-For / X-Real-IP / Forwarded when present, else the
// peer address, so the router must be served with connect info.
//
// Applied in main.rs, not build_app: the key extractor needs connect info,
// which in-process router tests don't have.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};

pub const RATE_LIMIT_PER_SECOND: u64 = 10;
pub const RATE_LIMIT_BURST: u32 = 20;

pub fn with_rate_limit(router: Router) -> Result<Router> {
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(RATE_LIMIT_PER_SECOND)
            .burst_size(RATE_LIMIT_BURST)
            .key_extractor(SmartIpKeyExtractor)
            .use_headers()
            .finish()
            .context("Invalid rate limiter configuration")?,
    );

    Ok(router.layer(GovernorLayer { config }))
}
