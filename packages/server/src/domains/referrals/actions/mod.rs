//! Referral counter actions

mod count;
mod list;
mod sync_rewards;

pub use count::count_direct_referrals;
pub use list::list_referrals;
pub use sync_rewards::sync_rewards_for_owner;
