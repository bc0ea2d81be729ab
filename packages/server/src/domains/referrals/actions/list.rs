use crate::common::{PortalError, PortalResult};
use crate::domains::referrals::types::{total_pages, ReferralPage, ReferralSummary, MAX_PER_PAGE};
use crate::kernel::ServerDeps;

/// One page of a referrer's direct referrals, newest first, each with its
/// own direct-referral count
pub async fn list_referrals(
    referral_id: &str,
    page: u32,
    per_page: u32,
    deps: &ServerDeps,
) -> PortalResult<ReferralPage> {
    if page == 0 {
        return Err(PortalError::Invalid("page starts at 1".to_string()));
    }
    if per_page == 0 || per_page > MAX_PER_PAGE {
        return Err(PortalError::Invalid(format!(
            "perPage must be between 1 and {}",
            MAX_PER_PAGE
        )));
    }

    let referral_id = referral_id.trim().to_uppercase();
    let total = deps.customers.count_referred_by(&referral_id).await?;
    let offset = (page - 1).saturating_mul(per_page);

    let customers = deps
        .customers
        .list_referred_by(&referral_id, per_page, offset)
        .await?;

    let mut items = Vec::with_capacity(customers.len());
    for customer in customers {
        let count = deps.customers.count_referred_by(&customer.referral_id).await?;
        items.push(ReferralSummary::from_customer(customer, count));
    }

    Ok(ReferralPage {
        items,
        page,
        per_page,
        total,
        total_pages: total_pages(total, per_page),
    })
}
