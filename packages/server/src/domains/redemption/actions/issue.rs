//! Idempotent per-batch minting

use tracing::{debug, error, info};

use crate::common::{normalize_phone_number, PortalError, PortalResult, StoreError};
use crate::domains::redemption::models::{batch_number_for, generate_code, RedemptionCode};
use crate::kernel::ServerDeps;

/// Code-value collisions tolerated before giving up
pub const MAX_MINT_ATTEMPTS: usize = 5;

/// Mint the code for the batch `referral_count` has reached, unless it exists.
///
/// Returns the newly minted code, or `None` when there is nothing to mint
/// (batch 0, or the batch already has a code). Concurrent callers for the
/// same batch are arbitrated by the store's `(owner, batch)` uniqueness, so
/// at most one of them gets `Some`.
pub async fn maybe_issue_for_count(
    owner_phone_number: &str,
    referral_count: u64,
    deps: &ServerDeps,
) -> PortalResult<Option<RedemptionCode>> {
    let owner = normalize_phone_number(owner_phone_number)?;
    let batch_number = batch_number_for(referral_count);
    if batch_number == 0 {
        return Ok(None);
    }

    if deps
        .redemption_codes
        .find_by_owner_and_batch(&owner, batch_number)
        .await?
        .is_some()
    {
        debug!(owner = %owner, batch_number, "Batch already has a redemption code");
        return Ok(None);
    }

    for attempt in 1..=MAX_MINT_ATTEMPTS {
        let candidate = RedemptionCode::mint(&owner, batch_number, generate_code(), deps.now());

        match deps.redemption_codes.insert(&candidate).await {
            Ok(code) => {
                info!(
                    owner = %owner,
                    batch_number,
                    code_id = %code.id,
                    "Minted redemption code"
                );
                return Ok(Some(code));
            }
            Err(StoreError::AlreadyExists) => {
                debug!(owner = %owner, batch_number, "Lost mint race; batch already has a code");
                return Ok(None);
            }
            Err(StoreError::Conflict) => {
                info!(attempt, "Redemption code collision, retrying with a fresh code");
            }
            Err(e) => {
                error!(owner = %owner, batch_number, error = %e, "Failed to mint redemption code");
                return Err(e.into());
            }
        }
    }

    error!(
        owner = %owner,
        batch_number,
        "Gave up minting after {} code collisions", MAX_MINT_ATTEMPTS
    );
    Err(PortalError::Unavailable(
        "could not allocate a unique redemption code".to_string(),
    ))
}
