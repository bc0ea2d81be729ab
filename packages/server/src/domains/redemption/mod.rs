//! Redemption domain - batch-minted discount codes
//!
//! One code per (owner, batch) where batch = floor(referrals / 5).
//! Codes move Active -> Verified -> Used; Expired is derived at read time.

pub mod actions;
pub mod models;

pub use models::{RedemptionCode, RedemptionStatus, BATCH_SIZE, REDEMPTION_TTL_DAYS};
