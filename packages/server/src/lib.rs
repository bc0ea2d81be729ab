// Referral Portal - API Core
//
// Phone OTP sign-in, referral bookkeeping and batch redemption codes.
// Each domain owns its models (storage) and actions (business logic);
// infrastructure lives behind the traits in `kernel`.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
