//! Server dependencies for domain actions (using traits for testability)
//!
//! This module provides the central dependency container used by every
//! action. All external services use trait abstractions to enable testing.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use twilio::TwilioService;

use crate::domains::auth::JwtService;
use crate::kernel::{
    BaseChallengeStore, BaseClock, BaseCustomerStore, BaseRedemptionCodeStore, BaseSmsSender,
};

// =============================================================================
// TwilioService Adapter (implements BaseSmsSender trait)
// =============================================================================

/// Wrapper around TwilioService that implements BaseSmsSender trait
pub struct TwilioAdapter(pub Arc<TwilioService>);

impl TwilioAdapter {
    pub fn new(service: Arc<TwilioService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseSmsSender for TwilioAdapter {
    async fn send(&self, phone_number: &str, message: &str) -> Result<()> {
        self.0
            .send_message(phone_number, message)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

// =============================================================================
// System clock
// =============================================================================

pub struct SystemClock;

impl BaseClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to actions (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub challenges: Arc<dyn BaseChallengeStore>,
    pub customers: Arc<dyn BaseCustomerStore>,
    pub redemption_codes: Arc<dyn BaseRedemptionCodeStore>,
    pub sms: Arc<dyn BaseSmsSender>,
    pub clock: Arc<dyn BaseClock>,
    /// JWT service for session tokens
    pub jwt_service: Arc<JwtService>,
    pub test_identifier_enabled: bool,
    pub admin_identifiers: Vec<String>,
}

impl ServerDeps {
    /// Create ServerDeps backed by a single store that implements every
    /// store trait (Postgres or in-memory)
    pub fn with_store<S>(
        store: Arc<S>,
        sms: Arc<dyn BaseSmsSender>,
        clock: Arc<dyn BaseClock>,
        jwt_service: Arc<JwtService>,
        test_identifier_enabled: bool,
        admin_identifiers: Vec<String>,
    ) -> Self
    where
        S: BaseChallengeStore + BaseCustomerStore + BaseRedemptionCodeStore + 'static,
    {
        Self {
            challenges: store.clone(),
            customers: store.clone(),
            redemption_codes: store,
            sms,
            clock,
            jwt_service,
            test_identifier_enabled,
            admin_identifiers,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
