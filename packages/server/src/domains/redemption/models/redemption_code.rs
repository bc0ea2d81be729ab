use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use crate::common::{StoreError, UnknownVariant};

/// Referrals needed per redemption code
pub const BATCH_SIZE: u64 = 5;

/// How long a minted code can be verified
pub const REDEMPTION_TTL_DAYS: i64 = 30;

/// Lifecycle of a redemption code
///
/// `Expired` is never written to storage; it is derived from `expires_at`
/// by [`RedemptionCode::effective_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedemptionStatus {
    Active,
    Verified,
    Used,
    Expired,
}

impl RedemptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedemptionStatus::Active => "active",
            RedemptionStatus::Verified => "verified",
            RedemptionStatus::Used => "used",
            RedemptionStatus::Expired => "expired",
        }
    }

    /// Verified and Used never change again
    pub fn is_resolved(&self) -> bool {
        matches!(self, RedemptionStatus::Verified | RedemptionStatus::Used)
    }
}

impl FromStr for RedemptionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RedemptionStatus::Active),
            "verified" => Ok(RedemptionStatus::Verified),
            "used" => Ok(RedemptionStatus::Used),
            "expired" => Ok(RedemptionStatus::Expired),
            other => Err(UnknownVariant {
                kind: "redemption status",
                value: other.to_string(),
            }),
        }
    }
}

/// RedemptionCode - one per (owner, batch)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionCode {
    pub id: Uuid,
    pub owner_phone_number: String,
    pub code: String,
    pub batch_number: i32,
    pub status: RedemptionStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
}

impl RedemptionCode {
    /// A fresh Active code for `batch_number`, valid for 30 days from `now`
    pub fn mint(owner_phone_number: &str, batch_number: i32, code: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner_phone_number: owner_phone_number.to_string(),
            code,
            batch_number,
            status: RedemptionStatus::Active,
            created_at: now,
            expires_at: now + Duration::days(REDEMPTION_TTL_DAYS),
            verified_at: None,
            used_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Status for display: unresolved codes past `expires_at` read as Expired
    pub fn effective_status(&self, now: DateTime<Utc>) -> RedemptionStatus {
        if !self.status.is_resolved() && self.is_expired(now) {
            RedemptionStatus::Expired
        } else {
            self.status
        }
    }
}

impl<'r> FromRow<'r, PgRow> for RedemptionCode {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        Ok(Self {
            id: row.try_get("id")?,
            owner_phone_number: row.try_get("owner_phone_number")?,
            code: row.try_get("code")?,
            batch_number: row.try_get("batch_number")?,
            status: status.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
            verified_at: row.try_get("verified_at")?,
            used_at: row.try_get("used_at")?,
        })
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl RedemptionCode {
    pub async fn find_by_owner_and_batch(
        owner_phone_number: &str,
        batch_number: i32,
        pool: &PgPool,
    ) -> Result<Option<Self>, StoreError> {
        let code = sqlx::query_as::<_, Self>(
            "SELECT * FROM redemption_codes WHERE owner_phone_number = $1 AND batch_number = $2",
        )
        .bind(owner_phone_number)
        .bind(batch_number)
        .fetch_optional(pool)
        .await?;
        Ok(code)
    }

    /// Insert a minted code
    ///
    /// `redemption_codes_owner_batch_key` makes a second mint for the same
    /// batch fail with `AlreadyExists`; `redemption_codes_code_key` makes a
    /// code collision fail with `Conflict`.
    pub async fn insert(&self, pool: &PgPool) -> Result<Self, StoreError> {
        let code = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO redemption_codes (
                id, owner_phone_number, code, batch_number, status,
                created_at, expires_at, verified_at, used_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.owner_phone_number)
        .bind(&self.code)
        .bind(self.batch_number)
        .bind(self.status.as_str())
        .bind(self.created_at)
        .bind(self.expires_at)
        .bind(self.verified_at)
        .bind(self.used_at)
        .fetch_one(pool)
        .await?;
        Ok(code)
    }

    pub async fn find_active_by_code(code: &str, pool: &PgPool) -> Result<Option<Self>, StoreError> {
        let code = sqlx::query_as::<_, Self>(
            "SELECT * FROM redemption_codes WHERE code = $1 AND status = 'active'",
        )
        .bind(code)
        .fetch_optional(pool)
        .await?;
        Ok(code)
    }

    /// Active -> Verified; no row comes back if another caller got there first
    pub async fn mark_verified(
        id: Uuid,
        verified_at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>, StoreError> {
        let code = sqlx::query_as::<_, Self>(
            r#"
            UPDATE redemption_codes
            SET status = 'verified', verified_at = $2
            WHERE id = $1 AND status = 'active'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(verified_at)
        .fetch_optional(pool)
        .await?;
        Ok(code)
    }

    /// Verified -> Used
    pub async fn mark_used(
        code: &str,
        used_at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>, StoreError> {
        let code = sqlx::query_as::<_, Self>(
            r#"
            UPDATE redemption_codes
            SET status = 'used', used_at = $2
            WHERE code = $1 AND status = 'verified'
            RETURNING *
            "#,
        )
        .bind(code)
        .bind(used_at)
        .fetch_optional(pool)
        .await?;
        Ok(code)
    }

    pub async fn list_for_owner(
        owner_phone_number: &str,
        pool: &PgPool,
    ) -> Result<Vec<Self>, StoreError> {
        let codes = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM redemption_codes
            WHERE owner_phone_number = $1
            ORDER BY created_at DESC, batch_number DESC
            "#,
        )
        .bind(owner_phone_number)
        .fetch_all(pool)
        .await?;
        Ok(codes)
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Batch reached by a referral count: floor(count / 5)
pub fn batch_number_for(referral_count: u64) -> i32 {
    i32::try_from(referral_count / BATCH_SIZE).unwrap_or(i32::MAX)
}

/// Random 10-digit code with no leading zero
pub fn generate_code() -> String {
    rand::rng()
        .random_range(1_000_000_000u64..=9_999_999_999u64)
        .to_string()
}
