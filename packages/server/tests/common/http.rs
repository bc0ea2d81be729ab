//! Request helpers for driving the router in-process.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use super::TestHarness;

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// The `error` kind of an error body
    pub fn error_kind(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

impl TestHarness {
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, path, None, token).await
    }

    pub async fn post(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.request(Method::POST, path, Some(body), token).await
    }

    /// Send an OTP, read it back from the mock SMS sender, and verify it.
    ///
    /// Returns the verify response body (`customer`, `isNewCustomer`, `token`).
    pub async fn sign_in(&self, phone_number: &str, referral_code: Option<&str>) -> Value {
        let sent = self
            .post(
                "/otp/send",
                serde_json::json!({ "phoneNumber": phone_number, "referralCode": referral_code }),
                None,
            )
            .await;
        assert_eq!(sent.status, StatusCode::OK, "send failed: {:?}", sent.body);

        let code = self
            .deps
            .sms
            .last_code_for(phone_number)
            .expect("an OTP was sent");

        let verified = self
            .post(
                "/otp/verify",
                serde_json::json!({ "phoneNumber": phone_number, "code": code }),
                None,
            )
            .await;
        assert_eq!(verified.status, StatusCode::OK, "verify failed: {:?}", verified.body);
        verified.body
    }

    /// Sign in and return just the session token and referral id
    pub async fn sign_in_token(&self, phone_number: &str, referral_code: Option<&str>) -> (String, String) {
        let body = self.sign_in(phone_number, referral_code).await;
        (
            body["token"].as_str().unwrap().to_string(),
            body["customer"]["referralId"].as_str().unwrap().to_string(),
        )
    }
}
