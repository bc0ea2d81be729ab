//! Referral edge resolution shared by creation and the name step

use tracing::{info, warn};

use crate::common::PortalResult;
use crate::domains::customer::models::Customer;
use crate::domains::referrals::actions::sync_rewards_for_owner;
use crate::kernel::ServerDeps;

/// Resolve a referral code entered by `phone_number` to the code to store
/// in `referred_by`.
///
/// Unknown codes and a customer's own code resolve to `None` and are only
/// logged; sign-up never fails because of a bad referral code.
pub async fn resolve_referrer(
    phone_number: &str,
    referral_code: Option<&str>,
    deps: &ServerDeps,
) -> PortalResult<Option<Customer>> {
    let Some(code) = referral_code.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    let code = code.to_uppercase();

    match deps.customers.find_by_referral_id(&code).await? {
        Some(referrer) if referrer.phone_number == phone_number => {
            warn!("Ignoring self-referral code {} for {}", code, phone_number);
            Ok(None)
        }
        Some(referrer) => Ok(Some(referrer)),
        None => {
            warn!("Invalid referral code {} for {}", code, phone_number);
            Ok(None)
        }
    }
}

/// Called once a referral edge to `referrer` has been written
pub(super) async fn on_referral_linked(referred: &Customer, referrer: &Customer, deps: &ServerDeps) {
    info!(
        "Referral linked: {} referred by code {}",
        referred.phone_number, referrer.referral_id
    );

    if let Err(e) = sync_rewards_for_owner(&referrer.phone_number, deps).await {
        warn!(
            referrer = %referrer.phone_number,
            error = %e,
            "Failed to sync redemption codes after referral; will retry on next sync"
        );
    }
}
