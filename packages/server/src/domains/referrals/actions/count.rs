use crate::common::{PortalError, PortalResult};
use crate::kernel::ServerDeps;

/// Number of customers whose `referred_by` is `referral_id` (direct edges only)
pub async fn count_direct_referrals(referral_id: &str, deps: &ServerDeps) -> PortalResult<u64> {
    let referral_id = referral_id.trim().to_uppercase();
    if referral_id.is_empty() {
        return Err(PortalError::Invalid("referral id must not be empty".to_string()));
    }
    Ok(deps.customers.count_referred_by(&referral_id).await?)
}
