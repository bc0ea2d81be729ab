//! Status transitions and listing

use tracing::info;

use crate::common::{normalize_phone_number, PortalError, PortalResult};
use crate::domains::redemption::models::RedemptionCode;
use crate::kernel::ServerDeps;

/// Active -> Verified for any code.
///
/// Unknown codes and codes that are already Verified or Used are both
/// `NotFound`. An Active code past its expiry is `Expired` and left as is.
pub async fn verify_code(code: &str, deps: &ServerDeps) -> PortalResult<RedemptionCode> {
    let found = find_active(code, deps).await?;
    verify_found(found, deps).await
}

/// Self-service verification: like [`verify_code`] but only for the owner's codes
pub async fn verify_owned_code(
    owner_phone_number: &str,
    code: &str,
    deps: &ServerDeps,
) -> PortalResult<RedemptionCode> {
    let owner = normalize_phone_number(owner_phone_number)?;
    let found = find_active(code, deps).await?;
    if found.owner_phone_number != owner {
        return Err(PortalError::NotFound("redemption code"));
    }
    verify_found(found, deps).await
}

/// Verified -> Used, recorded when an admin redeems a code at the counter
pub async fn mark_used(code: &str, deps: &ServerDeps) -> PortalResult<RedemptionCode> {
    let used = deps
        .redemption_codes
        .mark_used(code.trim(), deps.now())
        .await?
        .ok_or(PortalError::NotFound("redemption code"))?;

    info!(code_id = %used.id, owner = %used.owner_phone_number, "Redemption code used");
    Ok(used)
}

/// Every code the owner has earned, newest first
pub async fn list_for_owner(
    owner_phone_number: &str,
    deps: &ServerDeps,
) -> PortalResult<Vec<RedemptionCode>> {
    let owner = normalize_phone_number(owner_phone_number)?;
    Ok(deps.redemption_codes.list_for_owner(&owner).await?)
}

async fn find_active(code: &str, deps: &ServerDeps) -> PortalResult<RedemptionCode> {
    deps.redemption_codes
        .find_active_by_code(code.trim())
        .await?
        .ok_or(PortalError::NotFound("redemption code"))
}

async fn verify_found(found: RedemptionCode, deps: &ServerDeps) -> PortalResult<RedemptionCode> {
    let now = deps.now();
    if found.is_expired(now) {
        return Err(PortalError::Expired);
    }

    // A concurrent verifier may have won between the read and this swap
    let verified = deps
        .redemption_codes
        .mark_verified(found.id, now)
        .await?
        .ok_or(PortalError::NotFound("redemption code"))?;

    info!(code_id = %verified.id, owner = %verified.owner_phone_number, "Redemption code verified");
    Ok(verified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::redemption::actions::maybe_issue_for_count;
    use crate::domains::redemption::models::RedemptionStatus;
    use crate::kernel::TestDependencies;
    use chrono::Duration;

    const OWNER: &str = "+15550000000";

    async fn minted(deps: &ServerDeps) -> RedemptionCode {
        maybe_issue_for_count(OWNER, 5, deps).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_verify_round_trip() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();
        let code = minted(&deps).await;

        let listed = list_for_owner(OWNER, &deps).await.unwrap();
        assert_eq!(listed[0].status, RedemptionStatus::Active);

        let verified = verify_code(&code.code, &deps).await.unwrap();
        assert_eq!(verified.status, RedemptionStatus::Verified);
        assert_eq!(verified.verified_at, Some(deps.now()));

        assert!(matches!(
            verify_code(&code.code, &deps).await,
            Err(PortalError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_code_is_not_mutated() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();
        let code = minted(&deps).await;

        test_deps.clock.advance(Duration::days(31));

        assert!(matches!(
            verify_code(&code.code, &deps).await,
            Err(PortalError::Expired)
        ));

        let listed = list_for_owner(OWNER, &deps).await.unwrap();
        assert_eq!(listed[0].status, RedemptionStatus::Active);
        assert_eq!(
            listed[0].effective_status(deps.now()),
            RedemptionStatus::Expired
        );
    }

    #[tokio::test]
    async fn test_unknown_code_is_not_found() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();

        assert!(matches!(
            verify_code("1234567890", &deps).await,
            Err(PortalError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_owner_can_only_verify_own_code() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();
        let code = minted(&deps).await;

        assert!(matches!(
            verify_owned_code("+15551111111", &code.code, &deps).await,
            Err(PortalError::NotFound(_))
        ));

        let verified = verify_owned_code(OWNER, &code.code, &deps).await.unwrap();
        assert_eq!(verified.status, RedemptionStatus::Verified);
    }

    #[tokio::test]
    async fn test_mark_used_requires_verified() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();
        let code = minted(&deps).await;

        assert!(matches!(
            mark_used(&code.code, &deps).await,
            Err(PortalError::NotFound(_))
        ));

        verify_code(&code.code, &deps).await.unwrap();
        let used = mark_used(&code.code, &deps).await.unwrap();
        assert_eq!(used.status, RedemptionStatus::Used);
        assert!(used.used_at.is_some());

        assert!(matches!(
            mark_used(&code.code, &deps).await,
            Err(PortalError::NotFound(_))
        ));
    }
}
