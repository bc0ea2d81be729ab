// HTTP routes
pub mod customer;
pub mod health;
pub mod otp;
pub mod redemption_codes;
pub mod referrals;

pub use customer::*;
pub use health::*;
pub use otp::*;
pub use redemption_codes::*;
pub use referrals::*;
