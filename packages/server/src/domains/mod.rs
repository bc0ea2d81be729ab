// Business domains
pub mod auth;
pub mod customer;
pub mod redemption;
pub mod referrals;
