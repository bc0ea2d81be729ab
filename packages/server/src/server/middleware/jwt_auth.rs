use crate::common::normalize_phone_number;
use crate::domains::auth::JwtService;
use crate::server::error::ApiError;
use axum::{extract::Extension, middleware::Next, response::Response};
use std::sync::Arc;
use tracing::debug;

/// Authenticated customer information from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub phone_number: String,
    pub is_admin: bool,
}

impl AuthUser {
    /// Whether this session may act on behalf of `phone_number`
    pub fn can_act_for(&self, phone_number: &str) -> bool {
        if self.is_admin {
            return true;
        }
        normalize_phone_number(phone_number)
            .map(|p| p == self.phone_number)
            .unwrap_or(false)
    }

    pub fn require_act_for(&self, phone_number: &str) -> Result<(), ApiError> {
        if self.can_act_for(phone_number) {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }
}

/// Unwrap the optional extension the middleware may have inserted
pub fn require_auth(auth: Option<Extension<AuthUser>>) -> Result<AuthUser, ApiError> {
    auth.map(|Extension(user)| user)
        .ok_or_else(ApiError::unauthorized)
}

/// JWT authentication middleware
///
/// Extracts JWT token from Authorization header, verifies it, and adds AuthUser to request extensions.
/// If no token or invalid token, request continues without AuthUser (public access).
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth_user = extract_auth_user(&request, &jwt_service);

    if let Some(user) = auth_user {
        debug!(
            "Authenticated customer: {} (admin: {})",
            user.phone_number, user.is_admin
        );
        request.extensions_mut().insert(user);
    } else {
        debug!("No valid authentication token");
    }

    next.run(request).await
}

/// Extract and verify JWT token from request
fn extract_auth_user(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> Option<AuthUser> {
    let auth_header = request.headers().get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;

    // Accept both "Bearer <token>" and a raw token
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);

    let claims = jwt_service.verify_token(token).ok()?;

    Some(AuthUser {
        phone_number: claims.phone_number,
        is_admin: claims.is_admin,
    })
}
