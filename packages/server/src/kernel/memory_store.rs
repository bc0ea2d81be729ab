//! In-memory store implementing every store trait.
//!
//! Suitable for:
//! - Development without Postgres (`DATABASE_URL` unset)
//! - Unit and integration tests
//!
//! All state sits behind one mutex, so each trait method is a single
//! critical section and gets the same uniqueness and compare-and-swap
//! guarantees as the Postgres constraints. The lock is never held across
//! an `.await`. Nothing survives a restart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::common::StoreError;
use crate::domains::auth::models::OtpChallenge;
use crate::domains::customer::models::Customer;
use crate::domains::redemption::models::{RedemptionCode, RedemptionStatus};
use crate::kernel::{BaseChallengeStore, BaseCustomerStore, BaseRedemptionCodeStore};

#[derive(Default)]
struct MemoryState {
    challenges: HashMap<String, OtpChallenge>,
    customers: HashMap<String, Customer>,
    redemption_codes: HashMap<Uuid, RedemptionCode>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl BaseChallengeStore for MemoryStore {
    async fn put(&self, challenge: &OtpChallenge) -> Result<(), StoreError> {
        self.state()?
            .challenges
            .insert(challenge.phone_number.clone(), challenge.clone());
        Ok(())
    }

    async fn get(&self, phone_number: &str) -> Result<Option<OtpChallenge>, StoreError> {
        Ok(self.state()?.challenges.get(phone_number).cloned())
    }

    async fn delete_if_matches(&self, phone_number: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state()?;
        match state.challenges.get(phone_number) {
            Some(existing) if existing.id == id => {
                state.challenges.remove(phone_number);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut state = self.state()?;
        let before = state.challenges.len();
        state.challenges.retain(|_, c| c.expires_at >= now);
        Ok((before - state.challenges.len()) as u64)
    }
}

#[async_trait]
impl BaseCustomerStore for MemoryStore {
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self.state()?.customers.get(phone_number).cloned())
    }

    async fn find_by_referral_id(
        &self,
        referral_id: &str,
    ) -> Result<Option<Customer>, StoreError> {
        Ok(self
            .state()?
            .customers
            .values()
            .find(|c| c.referral_id == referral_id)
            .cloned())
    }

    async fn insert(&self, customer: &Customer) -> Result<Customer, StoreError> {
        let mut state = self.state()?;
        if state.customers.contains_key(&customer.phone_number) {
            return Err(StoreError::AlreadyExists);
        }
        if state
            .customers
            .values()
            .any(|c| c.referral_id == customer.referral_id)
        {
            return Err(StoreError::Conflict);
        }
        state
            .customers
            .insert(customer.phone_number.clone(), customer.clone());
        Ok(customer.clone())
    }

    async fn update_profile(
        &self,
        phone_number: &str,
        full_name: &str,
        referred_by_if_unset: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<Customer>, StoreError> {
        let mut state = self.state()?;
        let Some(customer) = state.customers.get_mut(phone_number) else {
            return Ok(None);
        };
        customer.full_name = Some(full_name.to_string());
        if customer.referred_by.is_none() {
            customer.referred_by = referred_by_if_unset.map(str::to_string);
        }
        customer.last_login_at = now;
        Ok(Some(customer.clone()))
    }

    async fn touch_last_login(
        &self,
        phone_number: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Customer>, StoreError> {
        let mut state = self.state()?;
        Ok(state.customers.get_mut(phone_number).map(|customer| {
            customer.last_login_at = now;
            customer.clone()
        }))
    }

    async fn count_referred_by(&self, referral_id: &str) -> Result<u64, StoreError> {
        Ok(self
            .state()?
            .customers
            .values()
            .filter(|c| c.referred_by.as_deref() == Some(referral_id))
            .count() as u64)
    }

    async fn list_referred_by(
        &self,
        referral_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Customer>, StoreError> {
        let mut referred: Vec<Customer> = self
            .state()?
            .customers
            .values()
            .filter(|c| c.referred_by.as_deref() == Some(referral_id))
            .cloned()
            .collect();
        referred.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.phone_number.cmp(&b.phone_number))
        });
        Ok(referred
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

#[async_trait]
impl BaseRedemptionCodeStore for MemoryStore {
    async fn find_by_owner_and_batch(
        &self,
        owner_phone_number: &str,
        batch_number: i32,
    ) -> Result<Option<RedemptionCode>, StoreError> {
        Ok(self
            .state()?
            .redemption_codes
            .values()
            .find(|c| c.owner_phone_number == owner_phone_number && c.batch_number == batch_number)
            .cloned())
    }

    async fn insert(&self, code: &RedemptionCode) -> Result<RedemptionCode, StoreError> {
        let mut state = self.state()?;
        let codes = &state.redemption_codes;
        if codes.values().any(|c| {
            c.owner_phone_number == code.owner_phone_number && c.batch_number == code.batch_number
        }) {
            return Err(StoreError::AlreadyExists);
        }
        if codes.values().any(|c| c.code == code.code) {
            return Err(StoreError::Conflict);
        }
        state.redemption_codes.insert(code.id, code.clone());
        Ok(code.clone())
    }

    async fn find_active_by_code(&self, code: &str) -> Result<Option<RedemptionCode>, StoreError> {
        Ok(self
            .state()?
            .redemption_codes
            .values()
            .find(|c| c.code == code && c.status == RedemptionStatus::Active)
            .cloned())
    }

    async fn mark_verified(
        &self,
        id: Uuid,
        verified_at: DateTime<Utc>,
    ) -> Result<Option<RedemptionCode>, StoreError> {
        let mut state = self.state()?;
        Ok(state
            .redemption_codes
            .get_mut(&id)
            .filter(|c| c.status == RedemptionStatus::Active)
            .map(|c| {
                c.status = RedemptionStatus::Verified;
                c.verified_at = Some(verified_at);
                c.clone()
            }))
    }

    async fn mark_used(
        &self,
        code: &str,
        used_at: DateTime<Utc>,
    ) -> Result<Option<RedemptionCode>, StoreError> {
        let mut state = self.state()?;
        Ok(state
            .redemption_codes
            .values_mut()
            .find(|c| c.code == code && c.status == RedemptionStatus::Verified)
            .map(|c| {
                c.status = RedemptionStatus::Used;
                c.used_at = Some(used_at);
                c.clone()
            }))
    }

    async fn list_for_owner(
        &self,
        owner_phone_number: &str,
    ) -> Result<Vec<RedemptionCode>, StoreError> {
        let mut codes: Vec<RedemptionCode> = self
            .state()?
            .redemption_codes
            .values()
            .filter(|c| c.owner_phone_number == owner_phone_number)
            .cloned()
            .collect();
        codes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.batch_number.cmp(&a.batch_number))
        });
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::customer::models::CustomerRole;

    fn customer(phone: &str, referral_id: &str) -> Customer {
        Customer::new(phone, referral_id.to_string(), None, CustomerRole::Customer, Utc::now())
    }

    #[tokio::test]
    async fn test_delete_if_matches_ignores_superseded_challenge() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let first = OtpChallenge::new("+15551234567", "111111", None, now);
        let second = OtpChallenge::new("+15551234567", "222222", None, now);

        store.put(&first).await.unwrap();
        store.put(&second).await.unwrap();

        assert!(!store.delete_if_matches("+15551234567", first.id).await.unwrap());
        assert!(store.get("+15551234567").await.unwrap().is_some());
        assert!(store.delete_if_matches("+15551234567", second.id).await.unwrap());
        assert!(store.get("+15551234567").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_customer_insert_distinguishes_phone_and_referral_id_clashes() {
        let store = MemoryStore::new();
        BaseCustomerStore::insert(&store, &customer("+15550000001", "AAAAAA"))
            .await
            .unwrap();

        let same_phone = BaseCustomerStore::insert(&store, &customer("+15550000001", "BBBBBB")).await;
        assert!(matches!(same_phone, Err(StoreError::AlreadyExists)));

        let same_referral_id =
            BaseCustomerStore::insert(&store, &customer("+15550000002", "AAAAAA")).await;
        assert!(matches!(same_referral_id, Err(StoreError::Conflict)));
    }

    #[tokio::test]
    async fn test_update_profile_never_overwrites_referred_by() {
        let store = MemoryStore::new();
        BaseCustomerStore::insert(&store, &customer("+15550000001", "AAAAAA"))
            .await
            .unwrap();
        let now = Utc::now();

        let first = store
            .update_profile("+15550000001", "Asha", Some("REFONE"), now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.referred_by.as_deref(), Some("REFONE"));

        let second = store
            .update_profile("+15550000001", "Asha K", Some("REFTWO"), now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.referred_by.as_deref(), Some("REFONE"));
        assert_eq!(second.full_name.as_deref(), Some("Asha K"));
    }

    #[tokio::test]
    async fn test_redemption_insert_enforces_owner_batch_uniqueness() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let first = RedemptionCode::mint("+15550000000", 1, "1111111111".to_string(), now);
        let same_batch = RedemptionCode::mint("+15550000000", 1, "2222222222".to_string(), now);
        let same_code = RedemptionCode::mint("+15550000000", 2, "1111111111".to_string(), now);

        BaseRedemptionCodeStore::insert(&store, &first).await.unwrap();
        assert!(matches!(
            BaseRedemptionCodeStore::insert(&store, &same_batch).await,
            Err(StoreError::AlreadyExists)
        ));
        assert!(matches!(
            BaseRedemptionCodeStore::insert(&store, &same_code).await,
            Err(StoreError::Conflict)
        ));
    }
}
