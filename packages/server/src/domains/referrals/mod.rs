//! Referrals domain - direct referral counts and listings

pub mod actions;
pub mod types;

pub use types::{ReferralPage, ReferralSummary, DEFAULT_PER_PAGE, MAX_PER_PAGE};
