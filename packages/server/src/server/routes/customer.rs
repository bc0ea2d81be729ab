use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};

use crate::domains::auth::complete_name_step;
use crate::domains::customer::actions::find_customer;
use crate::domains::customer::models::Customer;
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;
use crate::server::middleware::{require_auth, AuthUser};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetNameRequest {
    pub phone_number: String,
    pub full_name: String,
    #[serde(default)]
    pub referral_code: Option<String>,
}

#[derive(Serialize)]
pub struct CustomerResponse {
    pub customer: Customer,
}

/// POST /customer/name - the name step for the token's own customer (or any, for admins)
pub async fn set_name_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Option<Extension<AuthUser>>,
    Json(body): Json<SetNameRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let user = require_auth(auth)?;
    user.require_act_for(&body.phone_number)?;

    let customer = complete_name_step(
        &body.phone_number,
        &body.full_name,
        body.referral_code.as_deref(),
        &state.deps,
    )
    .await?;

    Ok(Json(CustomerResponse { customer }))
}

/// GET /customer/me
pub async fn me_handler(
    Extension(state): Extension<AxumAppState>,
    auth: Option<Extension<AuthUser>>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let user = require_auth(auth)?;
    let customer = find_customer(&user.phone_number, &state.deps).await?;
    Ok(Json(CustomerResponse { customer }))
}
