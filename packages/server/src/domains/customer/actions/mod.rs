//! Customer domain actions

mod get_or_create;
mod referral_link;
mod set_full_name;

pub use get_or_create::{find_customer, get_or_create};
pub use referral_link::resolve_referrer;
pub use set_full_name::set_full_name;
