//! Postgres-backed store.
//!
//! Thin adapter from the store traits onto the model queries. Uniqueness and
//! conditional updates are enforced by the schema in `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::StoreError;
use crate::domains::auth::models::OtpChallenge;
use crate::domains::customer::models::Customer;
use crate::domains::redemption::models::RedemptionCode;
use crate::kernel::{BaseChallengeStore, BaseCustomerStore, BaseRedemptionCodeStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BaseChallengeStore for PgStore {
    async fn put(&self, challenge: &OtpChallenge) -> Result<(), StoreError> {
        challenge.upsert(&self.pool).await
    }

    async fn get(&self, phone_number: &str) -> Result<Option<OtpChallenge>, StoreError> {
        OtpChallenge::find_by_phone(phone_number, &self.pool).await
    }

    async fn delete_if_matches(&self, phone_number: &str, id: Uuid) -> Result<bool, StoreError> {
        OtpChallenge::delete_if_matches(phone_number, id, &self.pool).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        OtpChallenge::delete_expired(now, &self.pool).await
    }
}

#[async_trait]
impl BaseCustomerStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Customer>, StoreError> {
        Customer::find_by_phone(phone_number, &self.pool).await
    }

    async fn find_by_referral_id(
        &self,
        referral_id: &str,
    ) -> Result<Option<Customer>, StoreError> {
        Customer::find_by_referral_id(referral_id, &self.pool).await
    }

    async fn insert(&self, customer: &Customer) -> Result<Customer, StoreError> {
        customer.insert(&self.pool).await
    }

    async fn update_profile(
        &self,
        phone_number: &str,
        full_name: &str,
        referred_by_if_unset: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<Customer>, StoreError> {
        Customer::update_profile(phone_number, full_name, referred_by_if_unset, now, &self.pool).await
    }

    async fn touch_last_login(
        &self,
        phone_number: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Customer>, StoreError> {
        Customer::touch_last_login(phone_number, now, &self.pool).await
    }

    async fn count_referred_by(&self, referral_id: &str) -> Result<u64, StoreError> {
        Customer::count_referred_by(referral_id, &self.pool).await
    }

    async fn list_referred_by(
        &self,
        referral_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Customer>, StoreError> {
        Customer::list_referred_by(referral_id, limit, offset, &self.pool).await
    }
}

#[async_trait]
impl BaseRedemptionCodeStore for PgStore {
    async fn find_by_owner_and_batch(
        &self,
        owner_phone_number: &str,
        batch_number: i32,
    ) -> Result<Option<RedemptionCode>, StoreError> {
        RedemptionCode::find_by_owner_and_batch(owner_phone_number, batch_number, &self.pool).await
    }

    async fn insert(&self, code: &RedemptionCode) -> Result<RedemptionCode, StoreError> {
        code.insert(&self.pool).await
    }

    async fn find_active_by_code(&self, code: &str) -> Result<Option<RedemptionCode>, StoreError> {
        RedemptionCode::find_active_by_code(code, &self.pool).await
    }

    async fn mark_verified(
        &self,
        id: Uuid,
        verified_at: DateTime<Utc>,
    ) -> Result<Option<RedemptionCode>, StoreError> {
        RedemptionCode::mark_verified(id, verified_at, &self.pool).await
    }

    async fn mark_used(
        &self,
        code: &str,
        used_at: DateTime<Utc>,
    ) -> Result<Option<RedemptionCode>, StoreError> {
        RedemptionCode::mark_used(code, used_at, &self.pool).await
    }

    async fn list_for_owner(
        &self,
        owner_phone_number: &str,
    ) -> Result<Vec<RedemptionCode>, StoreError> {
        RedemptionCode::list_for_owner(owner_phone_number, &self.pool).await
    }
}
