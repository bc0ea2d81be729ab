//! Sign-in session orchestration.
//!
//! ```text
//! Phone ──submit_phone──► Otp ──submit_code──► Done            (existing customer)
//!   ▲                      │  └──submit_code──► Name ──submit_name──► Done (new customer)
//!   └────────back──────────┘
//! ```
//!
//! The HTTP surface is stateless and calls the step functions directly;
//! `SignInSession` drives the same steps for callers that hold state
//! (and for tests of the full flow).

use serde::Serialize;

use crate::common::{PortalError, PortalResult};
use crate::domains::auth::actions::{issue_challenge, verify_challenge};
use crate::domains::auth::models::OtpChallenge;
use crate::domains::customer::actions::{get_or_create, set_full_name};
use crate::domains::customer::models::Customer;
use crate::kernel::ServerDeps;

/// Result of a completed sign-in
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInOutcome {
    pub customer: Customer,
    pub is_new_customer: bool,
}

/// Phone step: issue a challenge, remembering the referral code with it
pub async fn start_sign_in(
    phone_number: &str,
    referral_code: Option<&str>,
    deps: &ServerDeps,
) -> PortalResult<OtpChallenge> {
    issue_challenge(phone_number, referral_code, deps).await
}

/// Otp step: verify the code, then find or create the customer using the
/// referral code captured on the phone step
pub async fn complete_otp_step(
    phone_number: &str,
    code: &str,
    deps: &ServerDeps,
) -> PortalResult<SignInOutcome> {
    let challenge = verify_challenge(phone_number, code, deps).await?;
    let (customer, is_new_customer) = get_or_create(
        &challenge.phone_number,
        challenge.referral_code.as_deref(),
        deps,
    )
    .await?;

    Ok(SignInOutcome {
        customer,
        is_new_customer,
    })
}

/// Name step: store the name for a new customer
pub async fn complete_name_step(
    phone_number: &str,
    full_name: &str,
    referral_code: Option<&str>,
    deps: &ServerDeps,
) -> PortalResult<Customer> {
    set_full_name(phone_number, full_name, referral_code, deps).await
}

/// Where a sign-in currently stands
#[derive(Debug, Clone)]
pub enum SignInStep {
    Phone,
    Otp {
        phone_number: String,
        referral_code: Option<String>,
    },
    Name {
        customer: Customer,
        referral_code: Option<String>,
    },
    Done(SignInOutcome),
}

/// Stateful driver for one sign-in attempt
///
/// A failed step leaves the session where it was.
#[derive(Debug, Clone)]
pub struct SignInSession {
    step: SignInStep,
}

impl Default for SignInSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SignInSession {
    pub fn new() -> Self {
        Self {
            step: SignInStep::Phone,
        }
    }

    pub fn step(&self) -> &SignInStep {
        &self.step
    }

    pub fn outcome(&self) -> Option<&SignInOutcome> {
        match &self.step {
            SignInStep::Done(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub async fn submit_phone(
        &mut self,
        phone_number: &str,
        referral_code: Option<&str>,
        deps: &ServerDeps,
    ) -> PortalResult<()> {
        if !matches!(self.step, SignInStep::Phone) {
            return Err(PortalError::InvalidTransition("phone number already submitted"));
        }

        let challenge = start_sign_in(phone_number, referral_code, deps).await?;
        self.step = SignInStep::Otp {
            phone_number: challenge.phone_number,
            referral_code: challenge.referral_code,
        };
        Ok(())
    }

    /// Go back from the code step to re-enter the phone number.
    ///
    /// The pending challenge is simply abandoned; the next `submit_phone`
    /// replaces it.
    pub fn back(&mut self) -> PortalResult<()> {
        match self.step {
            SignInStep::Otp { .. } => {
                self.step = SignInStep::Phone;
                Ok(())
            }
            _ => Err(PortalError::InvalidTransition("can only go back from the code step")),
        }
    }

    pub async fn submit_code(&mut self, code: &str, deps: &ServerDeps) -> PortalResult<()> {
        let SignInStep::Otp {
            phone_number,
            referral_code,
        } = &self.step
        else {
            return Err(PortalError::InvalidTransition("no code is pending"));
        };
        let referral_code = referral_code.clone();

        let outcome = complete_otp_step(phone_number, code, deps).await?;
        self.step = if outcome.is_new_customer {
            SignInStep::Name {
                customer: outcome.customer,
                referral_code,
            }
        } else {
            SignInStep::Done(outcome)
        };
        Ok(())
    }

    pub async fn submit_name(&mut self, full_name: &str, deps: &ServerDeps) -> PortalResult<()> {
        let SignInStep::Name {
            customer,
            referral_code,
        } = &self.step
        else {
            return Err(PortalError::InvalidTransition("name is only asked of new customers"));
        };

        let phone_number = customer.phone_number.clone();
        let referral_code = referral_code.clone();

        let customer =
            complete_name_step(&phone_number, full_name, referral_code.as_deref(), deps).await?;
        self.step = SignInStep::Done(SignInOutcome {
            customer,
            is_new_customer: true,
        });
        Ok(())
    }
}
