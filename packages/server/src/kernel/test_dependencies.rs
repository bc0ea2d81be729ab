// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{
    BaseChallengeStore, BaseClock, BaseCustomerStore, BaseRedemptionCodeStore, BaseSmsSender,
    MemoryStore, ServerDeps,
};
use crate::common::StoreError;
use crate::domains::auth::models::OtpChallenge;
use crate::domains::auth::JwtService;
use crate::domains::customer::models::Customer;
use crate::domains::redemption::models::RedemptionCode;

// =============================================================================
// Mock SMS Sender
// =============================================================================

/// A message captured by MockSmsSender
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub phone_number: String,
    pub body: String,
}

pub struct MockSmsSender {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    fail: AtomicBool,
}

impl MockSmsSender {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: AtomicBool::new(false),
        }
    }

    /// Make every subsequent send fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Get all messages that were sent
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Extract the 6-digit code from the latest message to `phone_number`
    pub fn last_code_for(&self, phone_number: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m.phone_number == phone_number)
            .and_then(|m| {
                m.body
                    .split(|c: char| !c.is_ascii_digit())
                    .find(|word| word.len() == 6)
                    .map(str::to_string)
            })
    }
}

impl Default for MockSmsSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseSmsSender for MockSmsSender {
    async fn send(&self, phone_number: &str, message: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("mock SMS provider unavailable");
        }
        self.sent.lock().unwrap().push(SentMessage {
            phone_number: phone_number.to_string(),
            body: message.to_string(),
        });
        Ok(())
    }
}

// =============================================================================
// Fixed Clock
// =============================================================================

/// Clock that only moves when told to
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl BaseClock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// =============================================================================
// Colliding Store
// =============================================================================

/// Referral id given to the customer row that wins a simulated create race
pub const RACE_WINNER_REFERRAL_ID: &str = "WINNER";

/// Wraps a MemoryStore and makes inserts fail the way a busy backend would.
///
/// The next `n` customer or code inserts report `Conflict` (a taken
/// referral id or code value), and a customer insert can be made to lose
/// the phone-number race to another device. Every insert attempt is
/// recorded so tests can check that each retry used a fresh value.
pub struct CollidingStore {
    inner: Arc<MemoryStore>,
    customer_conflicts: AtomicUsize,
    code_conflicts: AtomicUsize,
    lose_customer_race: AtomicBool,
    attempted_referral_ids: Mutex<Vec<String>>,
    attempted_codes: Mutex<Vec<String>>,
}

impl CollidingStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            customer_conflicts: AtomicUsize::new(0),
            code_conflicts: AtomicUsize::new(0),
            lose_customer_race: AtomicBool::new(false),
            attempted_referral_ids: Mutex::new(Vec::new()),
            attempted_codes: Mutex::new(Vec::new()),
        }
    }

    pub fn with_customer_conflicts(self, n: usize) -> Self {
        self.customer_conflicts.store(n, Ordering::SeqCst);
        self
    }

    pub fn with_code_conflicts(self, n: usize) -> Self {
        self.code_conflicts.store(n, Ordering::SeqCst);
        self
    }

    /// The next customer insert finds another device already created the row
    pub fn losing_customer_race(self) -> Self {
        self.lose_customer_race.store(true, Ordering::SeqCst);
        self
    }

    pub fn attempted_referral_ids(&self) -> Vec<String> {
        self.attempted_referral_ids.lock().unwrap().clone()
    }

    pub fn attempted_codes(&self) -> Vec<String> {
        self.attempted_codes.lock().unwrap().clone()
    }

    fn take_one(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl BaseChallengeStore for CollidingStore {
    async fn put(&self, challenge: &OtpChallenge) -> Result<(), StoreError> {
        self.inner.put(challenge).await
    }

    async fn get(&self, phone_number: &str) -> Result<Option<OtpChallenge>, StoreError> {
        self.inner.get(phone_number).await
    }

    async fn delete_if_matches(&self, phone_number: &str, id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete_if_matches(phone_number, id).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        self.inner.purge_expired(now).await
    }
}

#[async_trait]
impl BaseCustomerStore for CollidingStore {
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Customer>, StoreError> {
        self.inner.find_by_phone(phone_number).await
    }

    async fn find_by_referral_id(
        &self,
        referral_id: &str,
    ) -> Result<Option<Customer>, StoreError> {
        self.inner.find_by_referral_id(referral_id).await
    }

    async fn insert(&self, customer: &Customer) -> Result<Customer, StoreError> {
        self.attempted_referral_ids
            .lock()
            .unwrap()
            .push(customer.referral_id.clone());

        if Self::take_one(&self.customer_conflicts) {
            return Err(StoreError::Conflict);
        }
        if self.lose_customer_race.swap(false, Ordering::SeqCst) {
            let mut winner = customer.clone();
            winner.referral_id = RACE_WINNER_REFERRAL_ID.to_string();
            BaseCustomerStore::insert(self.inner.as_ref(), &winner).await?;
            return Err(StoreError::AlreadyExists);
        }
        BaseCustomerStore::insert(self.inner.as_ref(), customer).await
    }

    async fn update_profile(
        &self,
        phone_number: &str,
        full_name: &str,
        referred_by_if_unset: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<Customer>, StoreError> {
        self.inner
            .update_profile(phone_number, full_name, referred_by_if_unset, now)
            .await
    }

    async fn touch_last_login(
        &self,
        phone_number: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Customer>, StoreError> {
        self.inner.touch_last_login(phone_number, now).await
    }

    async fn count_referred_by(&self, referral_id: &str) -> Result<u64, StoreError> {
        self.inner.count_referred_by(referral_id).await
    }

    async fn list_referred_by(
        &self,
        referral_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Customer>, StoreError> {
        self.inner.list_referred_by(referral_id, limit, offset).await
    }
}

#[async_trait]
impl BaseRedemptionCodeStore for CollidingStore {
    async fn find_by_owner_and_batch(
        &self,
        owner_phone_number: &str,
        batch_number: i32,
    ) -> Result<Option<RedemptionCode>, StoreError> {
        self.inner
            .find_by_owner_and_batch(owner_phone_number, batch_number)
            .await
    }

    async fn insert(&self, code: &RedemptionCode) -> Result<RedemptionCode, StoreError> {
        self.attempted_codes.lock().unwrap().push(code.code.clone());

        if Self::take_one(&self.code_conflicts) {
            return Err(StoreError::Conflict);
        }
        BaseRedemptionCodeStore::insert(self.inner.as_ref(), code).await
    }

    async fn find_active_by_code(&self, code: &str) -> Result<Option<RedemptionCode>, StoreError> {
        self.inner.find_active_by_code(code).await
    }

    async fn mark_verified(
        &self,
        id: Uuid,
        verified_at: DateTime<Utc>,
    ) -> Result<Option<RedemptionCode>, StoreError> {
        self.inner.mark_verified(id, verified_at).await
    }

    async fn mark_used(
        &self,
        code: &str,
        used_at: DateTime<Utc>,
    ) -> Result<Option<RedemptionCode>, StoreError> {
        self.inner.mark_used(code, used_at).await
    }

    async fn list_for_owner(
        &self,
        owner_phone_number: &str,
    ) -> Result<Vec<RedemptionCode>, StoreError> {
        self.inner.list_for_owner(owner_phone_number).await
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Bundle of in-memory dependencies with handles kept for assertions
pub struct TestDependencies {
    pub store: Arc<MemoryStore>,
    pub sms: Arc<MockSmsSender>,
    pub clock: Arc<FixedClock>,
    pub jwt_service: Arc<JwtService>,
    pub admin_identifiers: Vec<String>,
    pub test_identifier_enabled: bool,
}

impl TestDependencies {
    pub fn new() -> Self {
        let start = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Self {
            store: Arc::new(MemoryStore::new()),
            sms: Arc::new(MockSmsSender::new()),
            clock: Arc::new(FixedClock::new(start)),
            jwt_service: Arc::new(JwtService::new("test_secret_key", "test_issuer".to_string())),
            admin_identifiers: Vec::new(),
            test_identifier_enabled: false,
        }
    }

    pub fn with_admin(mut self, phone_number: &str) -> Self {
        self.admin_identifiers.push(phone_number.to_string());
        self
    }

    pub fn with_test_identifier(mut self) -> Self {
        self.test_identifier_enabled = true;
        self
    }

    pub fn server_deps(&self) -> ServerDeps {
        self.server_deps_with(self.store.clone())
    }

    /// ServerDeps over a different store (e.g. a CollidingStore around `self.store`)
    pub fn server_deps_with<S>(&self, store: Arc<S>) -> ServerDeps
    where
        S: BaseChallengeStore + BaseCustomerStore + BaseRedemptionCodeStore + 'static,
    {
        ServerDeps::with_store(
            store,
            self.sms.clone(),
            self.clock.clone(),
            self.jwt_service.clone(),
            self.test_identifier_enabled,
            self.admin_identifiers.clone(),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
