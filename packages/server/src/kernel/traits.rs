// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Each store method is a single conditional operation against the backend;
// the domain actions never compose a separate read and write where a
// uniqueness constraint or compare-and-swap is required.
//
// Naming convention: Base* for trait names (e.g., BaseSmsSender, BaseClock)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::common::StoreError;
use crate::domains::auth::models::OtpChallenge;
use crate::domains::customer::models::Customer;
use crate::domains::redemption::models::RedemptionCode;

// =============================================================================
// Notification Trait (Infrastructure - SMS)
// =============================================================================

#[async_trait]
pub trait BaseSmsSender: Send + Sync {
    /// Hand a message to the provider for delivery to `phone_number`
    async fn send(&self, phone_number: &str, message: &str) -> Result<()>;
}

// =============================================================================
// Clock Trait (Infrastructure)
// =============================================================================

/// All expiry math goes through this so tests can move time.
pub trait BaseClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

// =============================================================================
// Challenge Store (OTP)
// =============================================================================

#[async_trait]
pub trait BaseChallengeStore: Send + Sync {
    /// Store a challenge, replacing any existing one for the same phone number
    async fn put(&self, challenge: &OtpChallenge) -> Result<(), StoreError>;

    async fn get(&self, phone_number: &str) -> Result<Option<OtpChallenge>, StoreError>;

    /// Delete the challenge for `phone_number` only if it is still the one
    /// identified by `id`. Returns whether a row was removed.
    async fn delete_if_matches(&self, phone_number: &str, id: Uuid) -> Result<bool, StoreError>;

    /// Drop every challenge that expired before `now`
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

// =============================================================================
// Customer Store
// =============================================================================

#[async_trait]
pub trait BaseCustomerStore: Send + Sync {
    /// Cheap reachability check for health endpoints
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Customer>, StoreError>;

    async fn find_by_referral_id(&self, referral_id: &str)
        -> Result<Option<Customer>, StoreError>;

    /// Insert a new customer.
    ///
    /// Fails with `AlreadyExists` if the phone number is taken and with
    /// `Conflict` if the referral id is taken.
    async fn insert(&self, customer: &Customer) -> Result<Customer, StoreError>;

    /// Set `full_name`, stamp `last_login_at`, and set `referred_by` only when
    /// it is still unset. Returns `None` if no customer has this phone number.
    async fn update_profile(
        &self,
        phone_number: &str,
        full_name: &str,
        referred_by_if_unset: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<Customer>, StoreError>;

    async fn touch_last_login(
        &self,
        phone_number: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Customer>, StoreError>;

    async fn count_referred_by(&self, referral_id: &str) -> Result<u64, StoreError>;

    /// Customers referred by `referral_id`, newest first
    async fn list_referred_by(
        &self,
        referral_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Customer>, StoreError>;
}

// =============================================================================
// Redemption Code Store
// =============================================================================

#[async_trait]
pub trait BaseRedemptionCodeStore: Send + Sync {
    async fn find_by_owner_and_batch(
        &self,
        owner_phone_number: &str,
        batch_number: i32,
    ) -> Result<Option<RedemptionCode>, StoreError>;

    /// Insert a freshly minted code.
    ///
    /// Fails with `AlreadyExists` if the owner already has a code for this
    /// batch and with `Conflict` if the code value is taken.
    async fn insert(&self, code: &RedemptionCode) -> Result<RedemptionCode, StoreError>;

    async fn find_active_by_code(&self, code: &str) -> Result<Option<RedemptionCode>, StoreError>;

    /// Active -> Verified. Returns `None` if the code was no longer Active.
    async fn mark_verified(
        &self,
        id: Uuid,
        verified_at: DateTime<Utc>,
    ) -> Result<Option<RedemptionCode>, StoreError>;

    /// Verified -> Used, by code value. Returns `None` if no Verified code matches.
    async fn mark_used(
        &self,
        code: &str,
        used_at: DateTime<Utc>,
    ) -> Result<Option<RedemptionCode>, StoreError>;

    /// All codes for an owner, newest first
    async fn list_for_owner(
        &self,
        owner_phone_number: &str,
    ) -> Result<Vec<RedemptionCode>, StoreError>;
}
