//! Integration tests for referral counting and redemption codes over HTTP.

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{TestHarness, ADMIN_PHONE};
use serde_json::{json, Value};
use test_context::test_context;

const OWNER: &str = "+15550000000";

/// Sign `count` new customers up with the owner's referral code
async fn refer(ctx: &TestHarness, referral_id: &str, start: usize, count: usize) {
    for i in start..start + count {
        let phone = format!("+155510000{:02}", i);
        let verified = ctx.sign_in(&phone, Some(referral_id)).await;
        assert_eq!(verified["customer"]["referredBy"], referral_id);
    }
}

async fn owner_codes(ctx: &TestHarness, token: &str) -> Vec<Value> {
    let listed = ctx
        .get(&format!("/redemption-codes?owner={}", "%2B15550000000"), Some(token))
        .await;
    assert_eq!(listed.status, StatusCode::OK, "{:?}", listed.body);
    listed.body["codes"].as_array().unwrap().clone()
}

#[test_context(TestHarness)]
#[tokio::test]
async fn every_fifth_referral_mints_one_code(ctx: &mut TestHarness) {
    let (token, referral_id) = ctx.sign_in_token(OWNER, None).await;

    refer(ctx, &referral_id, 1, 4).await;
    assert!(owner_codes(ctx, &token).await.is_empty());

    refer(ctx, &referral_id, 5, 1).await;
    let codes = owner_codes(ctx, &token).await;
    assert_eq!(codes.len(), 1);
    assert_eq!(codes[0]["batchNumber"], 1);
    assert_eq!(codes[0]["status"], "active");
    assert_eq!(codes[0]["code"].as_str().unwrap().len(), 10);

    refer(ctx, &referral_id, 6, 6).await;
    let codes = owner_codes(ctx, &token).await;
    assert_eq!(codes.len(), 2);
    assert_eq!(codes[0]["batchNumber"], 2);

    let count = ctx
        .get(&format!("/referrals/count?referralId={}", referral_id), None)
        .await;
    assert_eq!(count.body["count"], 11);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn unknown_referral_code_still_signs_up(ctx: &mut TestHarness) {
    let verified = ctx.sign_in("+15551234567", Some("NOPE00")).await;
    assert_eq!(verified["isNewCustomer"], true);
    assert!(verified["customer"]["referredBy"].is_null());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn manual_sync_does_not_duplicate(ctx: &mut TestHarness) {
    let (token, referral_id) = ctx.sign_in_token(OWNER, None).await;
    refer(ctx, &referral_id, 1, 5).await;

    let synced = ctx
        .post("/redemption-codes/sync", json!({ "owner": OWNER }), Some(&token))
        .await;
    assert_eq!(synced.status, StatusCode::OK);
    assert!(synced.body["issued"].is_null());
    assert_eq!(owner_codes(ctx, &token).await.len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn codes_are_private_to_owner(ctx: &mut TestHarness) {
    let (_owner_token, referral_id) = ctx.sign_in_token(OWNER, None).await;
    refer(ctx, &referral_id, 1, 5).await;
    let (other_token, _) = ctx.sign_in_token("+15557777777", None).await;

    let listed = ctx
        .get("/redemption-codes?owner=%2B15550000000", Some(&other_token))
        .await;
    assert_eq!(listed.status, StatusCode::FORBIDDEN);

    let referrals = ctx
        .get(&format!("/referrals?referralId={}", referral_id), Some(&other_token))
        .await;
    assert_eq!(referrals.status, StatusCode::FORBIDDEN);

    let anonymous = ctx.get("/redemption-codes?owner=%2B15550000000", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn self_service_verify_only_for_own_codes(ctx: &mut TestHarness) {
    let (owner_token, referral_id) = ctx.sign_in_token(OWNER, None).await;
    refer(ctx, &referral_id, 1, 5).await;
    let code = owner_codes(ctx, &owner_token).await[0]["code"]
        .as_str()
        .unwrap()
        .to_string();

    let (other_token, _) = ctx.sign_in_token("+15557777777", None).await;
    let stolen = ctx
        .post("/redemption-codes/verify", json!({ "code": code }), Some(&other_token))
        .await;
    assert_eq!(stolen.status, StatusCode::NOT_FOUND);

    let verified = ctx
        .post("/redemption-codes/verify", json!({ "code": code }), Some(&owner_token))
        .await;
    assert_eq!(verified.status, StatusCode::OK);
    assert_eq!(verified.body["code"]["status"], "verified");

    let again = ctx
        .post("/redemption-codes/verify", json!({ "code": code }), Some(&owner_token))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn admin_verifies_and_redeems_any_code(ctx: &mut TestHarness) {
    let (owner_token, referral_id) = ctx.sign_in_token(OWNER, None).await;
    refer(ctx, &referral_id, 1, 5).await;
    let code = owner_codes(ctx, &owner_token).await[0]["code"]
        .as_str()
        .unwrap()
        .to_string();
    let (admin_token, _) = ctx.sign_in_token(ADMIN_PHONE, None).await;

    let by_customer = ctx
        .post("/redemption-codes/redeem", json!({ "code": code }), Some(&owner_token))
        .await;
    assert_eq!(by_customer.status, StatusCode::FORBIDDEN);

    let too_early = ctx
        .post("/redemption-codes/redeem", json!({ "code": code }), Some(&admin_token))
        .await;
    assert_eq!(too_early.status, StatusCode::NOT_FOUND);

    let verified = ctx
        .post("/redemption-codes/verify", json!({ "code": code }), Some(&admin_token))
        .await;
    assert_eq!(verified.status, StatusCode::OK);

    let redeemed = ctx
        .post("/redemption-codes/redeem", json!({ "code": code }), Some(&admin_token))
        .await;
    assert_eq!(redeemed.status, StatusCode::OK);
    assert_eq!(redeemed.body["code"]["status"], "used");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn stale_codes_list_as_expired_and_cannot_verify(ctx: &mut TestHarness) {
    let (owner_token, referral_id) = ctx.sign_in_token(OWNER, None).await;
    refer(ctx, &referral_id, 1, 5).await;
    let code = owner_codes(ctx, &owner_token).await[0]["code"]
        .as_str()
        .unwrap()
        .to_string();

    ctx.deps.clock.advance(Duration::days(31));

    let codes = owner_codes(ctx, &owner_token).await;
    assert_eq!(codes[0]["status"], "expired");

    let verified = ctx
        .post("/redemption-codes/verify", json!({ "code": code }), Some(&owner_token))
        .await;
    assert_eq!(verified.status, StatusCode::GONE);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn referral_listing_pages_newest_first(ctx: &mut TestHarness) {
    let (token, referral_id) = ctx.sign_in_token(OWNER, None).await;
    for i in 1..=12 {
        ctx.deps.clock.advance(Duration::minutes(1));
        refer(ctx, &referral_id, i, 1).await;
    }

    let first = ctx
        .get(&format!("/referrals?referralId={}", referral_id), Some(&token))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["total"], 12);
    assert_eq!(first.body["totalPages"], 2);
    assert_eq!(first.body["items"].as_array().unwrap().len(), 10);
    assert_eq!(first.body["items"][0]["phoneNumber"], "+15551000012");

    let second = ctx
        .get(
            &format!("/referrals?referralId={}&page=2&perPage=10", referral_id),
            Some(&token),
        )
        .await;
    assert_eq!(second.body["items"].as_array().unwrap().len(), 2);
}
