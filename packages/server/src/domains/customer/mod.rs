//! Customer domain - the customer directory
//!
//! Responsibilities:
//! - Create-or-fetch customers by phone number
//! - Unique referral id assignment
//! - Write-once referral edges (`referred_by`)

pub mod actions;
pub mod models;

pub use models::{Customer, CustomerRole, CustomerStatus};
