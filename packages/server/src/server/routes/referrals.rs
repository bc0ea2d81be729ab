use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domains::customer::actions::find_customer;
use crate::domains::referrals::actions::{count_direct_referrals, list_referrals};
use crate::domains::referrals::{ReferralPage, DEFAULT_PER_PAGE};
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;
use crate::server::middleware::{require_auth, AuthUser};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountQuery {
    pub referral_id: String,
}

#[derive(Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// GET /referrals/count?referralId=...
pub async fn referral_count_handler(
    Extension(state): Extension<AxumAppState>,
    Query(query): Query<CountQuery>,
) -> Result<Json<CountResponse>, ApiError> {
    let count = count_direct_referrals(&query.referral_id, &state.deps).await?;
    Ok(Json(CountResponse { count }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub referral_id: String,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /referrals?referralId=...&page=&perPage= - owner of the referral id or admin
pub async fn list_referrals_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Option<Extension<AuthUser>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ReferralPage>, ApiError> {
    let user = require_auth(auth)?;
    if !user.is_admin {
        let me = find_customer(&user.phone_number, &state.deps).await?;
        if !me.referral_id.eq_ignore_ascii_case(query.referral_id.trim()) {
            return Err(ApiError::forbidden());
        }
    }

    let page = list_referrals(
        &query.referral_id,
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(DEFAULT_PER_PAGE),
        &state.deps,
    )
    .await?;

    Ok(Json(page))
}
