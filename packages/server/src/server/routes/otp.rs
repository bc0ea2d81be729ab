//! POST /otp/send and POST /otp/verify
//!
//! The sign-in flow over HTTP is stateless: the referral code entered on the
//! phone step travels with the challenge, and a successful verify returns a
//! session token the later steps authenticate with.

use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};

use crate::domains::auth::{complete_otp_step, start_sign_in};
use crate::domains::customer::models::Customer;
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    pub phone_number: String,
    #[serde(default)]
    pub referral_code: Option<String>,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

pub async fn send_otp_handler(
    Extension(state): Extension<AxumAppState>,
    Json(body): Json<SendOtpRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    start_sign_in(&body.phone_number, body.referral_code.as_deref(), &state.deps).await?;
    Ok(Json(OkResponse { ok: true }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub phone_number: String,
    pub code: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpResponse {
    pub ok: bool,
    pub is_new_customer: bool,
    pub customer: Customer,
    pub token: String,
}

pub async fn verify_otp_handler(
    Extension(state): Extension<AxumAppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, ApiError> {
    let outcome = complete_otp_step(&body.phone_number, &body.code, &state.deps).await?;

    let token = state
        .deps
        .jwt_service
        .create_token(&outcome.customer.phone_number, outcome.customer.is_admin())
        .map_err(|e| ApiError::unavailable(format!("failed to issue session token: {}", e)))?;

    Ok(Json(VerifyOtpResponse {
        ok: true,
        is_new_customer: outcome.is_new_customer,
        customer: outcome.customer,
        token,
    }))
}
