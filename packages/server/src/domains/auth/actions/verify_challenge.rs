//! Verify OTP challenge action

use tracing::{info, warn};

use crate::common::{normalize_phone_number, PortalError, PortalResult};
use crate::domains::auth::models::OtpChallenge;
use crate::kernel::ServerDeps;

/// Check a submitted code against the pending challenge.
///
/// - `NotFound`: no challenge (never issued, already used, or superseded
///   and consumed by a concurrent verification)
/// - `Expired`: past its 5 minutes; the challenge is evicted
/// - `Mismatch`: wrong code; the challenge stays so the user can retry
///
/// On success the challenge is consumed and returned.
pub async fn verify_challenge(
    phone_number: &str,
    code: &str,
    deps: &ServerDeps,
) -> PortalResult<OtpChallenge> {
    let phone_number = normalize_phone_number(phone_number)?;

    let challenge = deps
        .challenges
        .get(&phone_number)
        .await?
        .ok_or(PortalError::NotFound("challenge"))?;

    if challenge.is_expired(deps.now()) {
        deps.challenges
            .delete_if_matches(&phone_number, challenge.id)
            .await?;
        info!("OTP expired for {}", phone_number);
        return Err(PortalError::Expired);
    }

    if !challenge.matches(code) {
        warn!("OTP mismatch for {}", phone_number);
        return Err(PortalError::Mismatch);
    }

    // Only one caller can consume a given challenge
    if !deps
        .challenges
        .delete_if_matches(&phone_number, challenge.id)
        .await?
    {
        return Err(PortalError::NotFound("challenge"));
    }

    info!("OTP verified for {}", phone_number);
    Ok(challenge)
}
