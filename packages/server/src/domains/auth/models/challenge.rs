use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::StoreError;

/// Number of digits in an OTP code
pub const OTP_LENGTH: usize = 6;

/// How long an issued OTP stays valid
pub const OTP_TTL_MINUTES: i64 = 5;

/// OtpChallenge - one pending sign-in code per phone number
///
/// The code itself is never stored; only its hash is. Issuing a new
/// challenge for the same phone number replaces the previous row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OtpChallenge {
    pub id: Uuid,
    pub phone_number: String,
    pub code_hash: String,
    /// Referral code entered on the phone step, applied on verification
    pub referral_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OtpChallenge {
    pub fn new(
        phone_number: &str,
        code: &str,
        referral_code: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            phone_number: phone_number.to_string(),
            code_hash: hash_code(phone_number, code),
            referral_code,
            created_at: now,
            expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn matches(&self, code: &str) -> bool {
        hash_code(&self.phone_number, code.trim()) == self.code_hash
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl OtpChallenge {
    /// Insert or replace the challenge for this phone number
    pub async fn upsert(&self, pool: &PgPool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO otp_challenges (id, phone_number, code_hash, referral_code, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (phone_number) DO UPDATE
            SET id = EXCLUDED.id,
                code_hash = EXCLUDED.code_hash,
                referral_code = EXCLUDED.referral_code,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(self.id)
        .bind(&self.phone_number)
        .bind(&self.code_hash)
        .bind(&self.referral_code)
        .bind(self.created_at)
        .bind(self.expires_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_phone(
        phone_number: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>, StoreError> {
        let challenge =
            sqlx::query_as::<_, Self>("SELECT * FROM otp_challenges WHERE phone_number = $1")
                .bind(phone_number)
                .fetch_optional(pool)
                .await?;
        Ok(challenge)
    }

    /// Compare-and-delete: only removes the row if it is still challenge `id`
    pub async fn delete_if_matches(
        phone_number: &str,
        id: Uuid,
        pool: &PgPool,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM otp_challenges WHERE phone_number = $1 AND id = $2")
            .bind(phone_number)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_expired(now: DateTime<Utc>, pool: &PgPool) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM otp_challenges WHERE expires_at < $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Hash an OTP code together with the phone number it was issued to (SHA256)
///
/// Binding the phone number in means two numbers holding the same code
/// never share a hash.
pub fn hash_code(phone_number: &str, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(phone_number.as_bytes());
    hasher.update(b":");
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}
