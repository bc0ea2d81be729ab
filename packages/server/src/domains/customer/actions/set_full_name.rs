//! Name-completion action

use tracing::info;

use super::get_or_create::get_or_create;
use super::referral_link::{on_referral_linked, resolve_referrer};
use crate::common::{normalize_phone_number, PortalError, PortalResult};
use crate::domains::customer::models::Customer;
use crate::kernel::ServerDeps;

/// Shortest accepted full name, in characters
pub const MIN_FULL_NAME_CHARS: usize = 2;

/// Upsert the customer's full name.
///
/// If the customer has no referral edge yet and `referral_code` resolves to
/// another customer, the edge is written in the same update. An existing
/// edge is never replaced.
pub async fn set_full_name(
    phone_number: &str,
    full_name: &str,
    referral_code: Option<&str>,
    deps: &ServerDeps,
) -> PortalResult<Customer> {
    let phone_number = normalize_phone_number(phone_number)?;
    let full_name = full_name.trim();
    if full_name.chars().count() < MIN_FULL_NAME_CHARS {
        return Err(PortalError::Invalid(format!(
            "full name must have at least {} characters",
            MIN_FULL_NAME_CHARS
        )));
    }

    let (existing, _) = get_or_create(&phone_number, referral_code, deps).await?;

    let referrer = if existing.referred_by.is_none() {
        resolve_referrer(&phone_number, referral_code, deps).await?
    } else {
        None
    };

    let customer = deps
        .customers
        .update_profile(
            &phone_number,
            full_name,
            referrer.as_ref().map(|r| r.referral_id.as_str()),
            deps.now(),
        )
        .await?
        .ok_or(PortalError::NotFound("customer"))?;

    info!("Saved name for customer {}", customer.phone_number);

    if let Some(referrer) = &referrer {
        // The edge only counts if this update is the one that wrote it
        if customer.referred_by.as_deref() == Some(referrer.referral_id.as_str()) {
            on_referral_linked(&customer, referrer, deps).await;
        }
    }

    Ok(customer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::TestDependencies;

    #[tokio::test]
    async fn test_sets_name_and_is_idempotent() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();

        let first = set_full_name("+15551234567", "  Meera Shah ", None, &deps).await.unwrap();
        let second = set_full_name("+15551234567", "Meera Shah", None, &deps).await.unwrap();

        assert_eq!(first.full_name.as_deref(), Some("Meera Shah"));
        assert_eq!(second.full_name, first.full_name);
        assert_eq!(second.referral_id, first.referral_id);
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();

        assert!(matches!(
            set_full_name("+15551234567", "   ", None, &deps).await,
            Err(PortalError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_single_character_name_is_rejected() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();

        assert!(matches!(
            set_full_name("+15551234567", " A ", None, &deps).await,
            Err(PortalError::Invalid(_))
        ));
        assert!(deps.customers.find_by_phone("+15551234567").await.unwrap().is_none());

        let customer = set_full_name("+15551234567", "Al", None, &deps).await.unwrap();
        assert_eq!(customer.full_name.as_deref(), Some("Al"));
    }

    #[tokio::test]
    async fn test_links_referral_when_unset() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();
        let (referrer, _) = get_or_create("+15550000000", None, &deps).await.unwrap();
        get_or_create("+15551234567", None, &deps).await.unwrap();

        let customer = set_full_name("+15551234567", "Dev", Some(&referrer.referral_id), &deps)
            .await
            .unwrap();

        assert_eq!(customer.referred_by.as_deref(), Some(referrer.referral_id.as_str()));
    }

    #[tokio::test]
    async fn test_referred_by_is_write_once() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();
        let (first_referrer, _) = get_or_create("+15550000001", None, &deps).await.unwrap();
        let (second_referrer, _) = get_or_create("+15550000002", None, &deps).await.unwrap();

        get_or_create("+15551234567", Some(&first_referrer.referral_id), &deps)
            .await
            .unwrap();
        let customer = set_full_name("+15551234567", "Dev", Some(&second_referrer.referral_id), &deps)
            .await
            .unwrap();

        assert_eq!(
            customer.referred_by.as_deref(),
            Some(first_referrer.referral_id.as_str())
        );
    }

    #[tokio::test]
    async fn test_own_referral_code_is_not_linked() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();
        let (customer, _) = get_or_create("+15551234567", None, &deps).await.unwrap();

        let updated = set_full_name("+15551234567", "Dev", Some(&customer.referral_id), &deps)
            .await
            .unwrap();

        assert!(updated.referred_by.is_none());
    }
}
