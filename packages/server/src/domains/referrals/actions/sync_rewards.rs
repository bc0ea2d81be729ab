use tracing::debug;

use crate::common::{normalize_phone_number, PortalError, PortalResult};
use crate::domains::redemption::actions::maybe_issue_for_count;
use crate::domains::redemption::models::RedemptionCode;
use crate::kernel::ServerDeps;

/// Recount the owner's referrals and mint the code for the batch reached,
/// if it has none yet
pub async fn sync_rewards_for_owner(
    owner_phone_number: &str,
    deps: &ServerDeps,
) -> PortalResult<Option<RedemptionCode>> {
    let owner_phone_number = normalize_phone_number(owner_phone_number)?;
    let owner = deps
        .customers
        .find_by_phone(&owner_phone_number)
        .await?
        .ok_or(PortalError::NotFound("customer"))?;

    let count = deps.customers.count_referred_by(&owner.referral_id).await?;
    debug!(owner = %owner.phone_number, count, "Syncing redemption codes");

    maybe_issue_for_count(&owner.phone_number, count, deps).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::customer::actions::get_or_create;
    use crate::domains::redemption::actions::list_for_owner;
    use crate::kernel::TestDependencies;

    const OWNER: &str = "+15550000000";

    #[tokio::test]
    async fn test_referral_events_mint_codes_per_batch() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();
        let (owner, _) = get_or_create(OWNER, None, &deps).await.unwrap();

        for i in 1..=4 {
            let phone = format!("+155510000{:02}", i);
            get_or_create(&phone, Some(&owner.referral_id), &deps).await.unwrap();
        }
        assert!(list_for_owner(OWNER, &deps).await.unwrap().is_empty());

        get_or_create("+15551000005", Some(&owner.referral_id), &deps).await.unwrap();
        let codes = list_for_owner(OWNER, &deps).await.unwrap();
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].batch_number, 1);

        for i in 6..=11 {
            let phone = format!("+155510000{:02}", i);
            get_or_create(&phone, Some(&owner.referral_id), &deps).await.unwrap();
        }
        let codes = list_for_owner(OWNER, &deps).await.unwrap();
        assert_eq!(codes.len(), 2);
        assert_eq!(codes.iter().filter(|c| c.batch_number == 2).count(), 1);
    }

    #[tokio::test]
    async fn test_manual_sync_is_idempotent() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();
        let (owner, _) = get_or_create(OWNER, None, &deps).await.unwrap();
        for i in 1..=5 {
            let phone = format!("+155510000{:02}", i);
            get_or_create(&phone, Some(&owner.referral_id), &deps).await.unwrap();
        }

        assert!(sync_rewards_for_owner(OWNER, &deps).await.unwrap().is_none());
        assert_eq!(list_for_owner(OWNER, &deps).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_owner_is_not_found() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();

        assert!(matches!(
            sync_rewards_for_owner(OWNER, &deps).await,
            Err(PortalError::NotFound(_))
        ));
    }
}
