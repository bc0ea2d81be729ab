//! Get-or-create customer action

use tracing::{error, info};

use super::referral_link::{on_referral_linked, resolve_referrer};
use crate::common::{normalize_phone_number, PortalError, PortalResult, StoreError};
use crate::domains::customer::models::{
    generate_referral_id, is_admin_identifier, Customer, CustomerRole,
};
use crate::kernel::ServerDeps;

/// Referral id collisions tolerated before giving up
pub const MAX_CREATE_ATTEMPTS: usize = 5;

/// Fetch a customer by phone number
pub async fn find_customer(phone_number: &str, deps: &ServerDeps) -> PortalResult<Customer> {
    let phone_number = normalize_phone_number(phone_number)?;
    deps.customers
        .find_by_phone(&phone_number)
        .await?
        .ok_or(PortalError::NotFound("customer"))
}

/// Fetch the customer for `phone_number`, creating it on first sign-in.
///
/// Returns `(customer, is_new)`. A new customer gets a fresh unique
/// referral id and, if `referral_code` belongs to another existing
/// customer, a `referred_by` edge. Existing customers are returned as-is
/// apart from `last_login_at`.
pub async fn get_or_create(
    phone_number: &str,
    referral_code: Option<&str>,
    deps: &ServerDeps,
) -> PortalResult<(Customer, bool)> {
    let phone_number = normalize_phone_number(phone_number)?;
    let now = deps.now();

    if let Some(customer) = deps.customers.touch_last_login(&phone_number, now).await? {
        return Ok((customer, false));
    }

    let referrer = resolve_referrer(&phone_number, referral_code, deps).await?;
    let role = if is_admin_identifier(&phone_number, &deps.admin_identifiers) {
        CustomerRole::Admin
    } else {
        CustomerRole::Customer
    };

    for attempt in 1..=MAX_CREATE_ATTEMPTS {
        let candidate = Customer::new(
            &phone_number,
            generate_referral_id(),
            referrer.as_ref().map(|r| r.referral_id.clone()),
            role,
            now,
        );

        match deps.customers.insert(&candidate).await {
            Ok(customer) => {
                info!(
                    "Created customer {} with referral id {}",
                    customer.phone_number, customer.referral_id
                );
                if let Some(referrer) = &referrer {
                    on_referral_linked(&customer, referrer, deps).await;
                }
                return Ok((customer, true));
            }
            Err(StoreError::AlreadyExists) => {
                // Another device finished creating this customer first
                let customer = deps
                    .customers
                    .find_by_phone(&phone_number)
                    .await?
                    .ok_or(PortalError::NotFound("customer"))?;
                return Ok((customer, false));
            }
            Err(StoreError::Conflict) => {
                info!(attempt, "Referral id collision, retrying with a fresh id");
            }
            Err(e) => {
                error!(phone_number = %phone_number, error = %e, "Failed to create customer");
                return Err(e.into());
            }
        }
    }

    error!(
        "Gave up creating customer {} after {} referral id collisions",
        phone_number, MAX_CREATE_ATTEMPTS
    );
    Err(PortalError::Unavailable(
        "could not allocate a unique referral id".to_string(),
    ))
}
