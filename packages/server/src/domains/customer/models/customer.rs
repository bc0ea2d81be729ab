use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};

use crate::common::{normalize_phone_number, StoreError, UnknownVariant};

/// Length of a customer's shareable referral id
pub const REFERRAL_ID_LENGTH: usize = 6;

const REFERRAL_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerRole {
    Customer,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    Active,
    Inactive,
}

/// Customer model - keyed by phone number
///
/// `referral_id` is assigned once at creation and is unique across all
/// customers. `referred_by` holds the referrer's `referral_id` and is
/// written at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub phone_number: String,
    pub full_name: Option<String>,
    pub referral_id: String,
    pub referred_by: Option<String>,
    pub role: CustomerRole,
    pub status: CustomerStatus,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(
        phone_number: &str,
        referral_id: String,
        referred_by: Option<String>,
        role: CustomerRole,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            phone_number: phone_number.to_string(),
            full_name: None,
            referral_id,
            referred_by,
            role,
            status: CustomerStatus::Active,
            created_at: now,
            last_login_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == CustomerRole::Admin
    }
}

impl CustomerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerRole::Customer => "customer",
            CustomerRole::Admin => "admin",
        }
    }
}

impl fmt::Display for CustomerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(CustomerRole::Customer),
            "admin" => Ok(CustomerRole::Admin),
            other => Err(UnknownVariant {
                kind: "customer role",
                value: other.to_string(),
            }),
        }
    }
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Active => "active",
            CustomerStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for CustomerStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CustomerStatus::Active),
            "inactive" => Ok(CustomerStatus::Inactive),
            other => Err(UnknownVariant {
                kind: "customer status",
                value: other.to_string(),
            }),
        }
    }
}

impl<'r> FromRow<'r, PgRow> for Customer {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        let status: String = row.try_get("status")?;
        Ok(Self {
            phone_number: row.try_get("phone_number")?,
            full_name: row.try_get("full_name")?,
            referral_id: row.try_get("referral_id")?,
            referred_by: row.try_get("referred_by")?,
            role: role.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            status: status.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            created_at: row.try_get("created_at")?,
            last_login_at: row.try_get("last_login_at")?,
        })
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Customer {
    pub async fn find_by_phone(phone_number: &str, pool: &PgPool) -> Result<Option<Self>, StoreError> {
        let customer = sqlx::query_as::<_, Self>("SELECT * FROM customers WHERE phone_number = $1")
            .bind(phone_number)
            .fetch_optional(pool)
            .await?;
        Ok(customer)
    }

    pub async fn find_by_referral_id(
        referral_id: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>, StoreError> {
        let customer = sqlx::query_as::<_, Self>("SELECT * FROM customers WHERE referral_id = $1")
            .bind(referral_id)
            .fetch_optional(pool)
            .await?;
        Ok(customer)
    }

    /// Insert new customer
    ///
    /// Relies on the primary key and `customers_referral_id_key` to reject
    /// duplicates; see `StoreError::from(sqlx::Error)`.
    pub async fn insert(&self, pool: &PgPool) -> Result<Self, StoreError> {
        let customer = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO customers (
                phone_number, full_name, referral_id, referred_by,
                role, status, created_at, last_login_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&self.phone_number)
        .bind(&self.full_name)
        .bind(&self.referral_id)
        .bind(&self.referred_by)
        .bind(self.role.as_str())
        .bind(self.status.as_str())
        .bind(self.created_at)
        .bind(self.last_login_at)
        .fetch_one(pool)
        .await?;
        Ok(customer)
    }

    /// Set the name and, only if still unset, the referral edge
    pub async fn update_profile(
        phone_number: &str,
        full_name: &str,
        referred_by_if_unset: Option<&str>,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>, StoreError> {
        let customer = sqlx::query_as::<_, Self>(
            r#"
            UPDATE customers
            SET full_name = $2,
                referred_by = COALESCE(referred_by, $3),
                last_login_at = $4
            WHERE phone_number = $1
            RETURNING *
            "#,
        )
        .bind(phone_number)
        .bind(full_name)
        .bind(referred_by_if_unset)
        .bind(now)
        .fetch_optional(pool)
        .await?;
        Ok(customer)
    }

    pub async fn touch_last_login(
        phone_number: &str,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>, StoreError> {
        let customer = sqlx::query_as::<_, Self>(
            "UPDATE customers SET last_login_at = $2 WHERE phone_number = $1 RETURNING *",
        )
        .bind(phone_number)
        .bind(now)
        .fetch_optional(pool)
        .await?;
        Ok(customer)
    }

    /// Count direct referrals (uses `idx_customers_referred_by`)
    pub async fn count_referred_by(referral_id: &str, pool: &PgPool) -> Result<u64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM customers WHERE referred_by = $1",
        )
        .bind(referral_id)
        .fetch_one(pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn list_referred_by(
        referral_id: &str,
        limit: u32,
        offset: u32,
        pool: &PgPool,
    ) -> Result<Vec<Self>, StoreError> {
        let customers = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM customers
            WHERE referred_by = $1
            ORDER BY created_at DESC, phone_number
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(referral_id)
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(pool)
        .await?;
        Ok(customers)
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Generate a random referral id (6 characters from A-Z0-9)
///
/// Uniqueness is enforced by the store; callers retry on `Conflict`.
pub fn generate_referral_id() -> String {
    let mut rng = rand::rng();
    (0..REFERRAL_ID_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..REFERRAL_ID_ALPHABET.len());
            REFERRAL_ID_ALPHABET[idx] as char
        })
        .collect()
}

/// Check if a phone number should be granted the admin role
///
/// `phone_number` is already normalized; entries are normalized before
/// comparing, and entries that are not phone numbers never match.
pub fn is_admin_identifier(phone_number: &str, admin_identifiers: &[String]) -> bool {
    admin_identifiers.iter().any(|admin_id| {
        normalize_phone_number(admin_id).is_ok_and(|admin_id| admin_id == phone_number)
    })
}
