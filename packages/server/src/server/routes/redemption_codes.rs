use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domains::redemption::actions::{
    list_for_owner, mark_used, verify_code, verify_owned_code,
};
use crate::domains::redemption::models::RedemptionCode;
use crate::domains::referrals::actions::sync_rewards_for_owner;
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;
use crate::server::middleware::{require_auth, AuthUser};

#[derive(Deserialize)]
pub struct OwnerQuery {
    pub owner: String,
}

#[derive(Serialize)]
pub struct CodesResponse {
    pub codes: Vec<RedemptionCode>,
}

/// GET /redemption-codes?owner=... - status in the response is the derived one
pub async fn list_codes_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Option<Extension<AuthUser>>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<CodesResponse>, ApiError> {
    let user = require_auth(auth)?;
    user.require_act_for(&query.owner)?;

    let now = state.deps.now();
    let codes = list_for_owner(&query.owner, &state.deps)
        .await?
        .into_iter()
        .map(|mut code| {
            code.status = code.effective_status(now);
            code
        })
        .collect();

    Ok(Json(CodesResponse { codes }))
}

#[derive(Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

#[derive(Serialize)]
pub struct CodeResponse {
    pub ok: bool,
    pub code: RedemptionCode,
}

/// POST /redemption-codes/verify - admins verify any code, customers their own
pub async fn verify_code_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Option<Extension<AuthUser>>,
    Json(body): Json<CodeRequest>,
) -> Result<Json<CodeResponse>, ApiError> {
    let user = require_auth(auth)?;

    let code = if user.is_admin {
        verify_code(&body.code, &state.deps).await?
    } else {
        verify_owned_code(&user.phone_number, &body.code, &state.deps).await?
    };

    Ok(Json(CodeResponse { ok: true, code }))
}

/// POST /redemption-codes/redeem - admin only
pub async fn redeem_code_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Option<Extension<AuthUser>>,
    Json(body): Json<CodeRequest>,
) -> Result<Json<CodeResponse>, ApiError> {
    let user = require_auth(auth)?;
    user.require_admin()?;

    let code = mark_used(&body.code, &state.deps).await?;
    Ok(Json(CodeResponse { ok: true, code }))
}

#[derive(Deserialize)]
pub struct SyncRequest {
    pub owner: String,
}

#[derive(Serialize)]
pub struct SyncResponse {
    pub issued: Option<RedemptionCode>,
}

/// POST /redemption-codes/sync
pub async fn sync_codes_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Option<Extension<AuthUser>>,
    Json(body): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, ApiError> {
    let user = require_auth(auth)?;
    user.require_act_for(&body.owner)?;

    let issued = sync_rewards_for_owner(&body.owner, &state.deps).await?;
    Ok(Json(SyncResponse { issued }))
}
