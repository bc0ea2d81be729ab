//! Issue OTP challenge action

use rand::Rng;
use tracing::{error, info, warn};

use crate::common::{normalize_phone_number, PortalError, PortalResult};
use crate::domains::auth::models::{OtpChallenge, OTP_LENGTH, OTP_TTL_MINUTES};
use crate::kernel::ServerDeps;

/// Phone number that signs in with a fixed code when test identifiers are enabled
pub const TEST_IDENTIFIER: &str = "+1234567890";

/// Fixed code for the test identifier
pub const TEST_OTP_CODE: &str = "123456";

pub fn is_test_identifier(phone_number: &str) -> bool {
    phone_number == TEST_IDENTIFIER
}

/// Uniformly random 6-digit code (leading zeros allowed)
pub fn generate_otp_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{:0width$}", n, width = OTP_LENGTH)
}

/// Issue a new OTP challenge and send the code by SMS.
///
/// Replaces any challenge still pending for the number. If the SMS cannot
/// be handed to the provider, the challenge just written is removed again
/// (unless a newer one has already replaced it) and `Unavailable` is returned.
pub async fn issue_challenge(
    phone_number: &str,
    referral_code: Option<&str>,
    deps: &ServerDeps,
) -> PortalResult<OtpChallenge> {
    // Production safety check - test identifier should never be enabled in production
    if deps.test_identifier_enabled && !cfg!(debug_assertions) {
        error!("SECURITY WARNING: TEST_IDENTIFIER_ENABLED is true in production build!");
    }

    let phone_number = normalize_phone_number(phone_number)?;
    let referral_code = referral_code
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_uppercase);

    let is_test = deps.test_identifier_enabled && is_test_identifier(&phone_number);
    let code = if is_test {
        TEST_OTP_CODE.to_string()
    } else {
        generate_otp_code()
    };

    let challenge = OtpChallenge::new(&phone_number, &code, referral_code, deps.now());
    deps.challenges.put(&challenge).await.map_err(|e| {
        error!(phone_number = %phone_number, error = %e, "Failed to store OTP challenge");
        PortalError::from(e)
    })?;

    if is_test {
        info!("Test identifier: skipping SMS for {}", phone_number);
        return Ok(challenge);
    }

    let message = format!(
        "Your verification code is {}. Valid for {} minutes.",
        code, OTP_TTL_MINUTES
    );

    if let Err(e) = deps.sms.send(&phone_number, &message).await {
        error!(phone_number = %phone_number, error = %e, "Failed to send OTP");
        if let Err(rollback) = deps
            .challenges
            .delete_if_matches(&phone_number, challenge.id)
            .await
        {
            warn!(
                phone_number = %phone_number,
                error = %rollback,
                "Could not roll back undelivered OTP challenge; it will expire"
            );
        }
        return Err(PortalError::Unavailable(format!("failed to send OTP: {}", e)));
    }

    info!("OTP sent to {}", phone_number);
    Ok(challenge)
}
