use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde_json::json;

use crate::models::User;
use crate::services::AuthService;
use crate::AppState;

/// Extractor for an authenticated, active admin.
///
/// Carries the raw bearer token so logout can revoke it.
pub struct AdminUser {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AuthError::MissingToken)?;

        let token = bearer.token().to_string();

        let user = AuthService::resolve_session(&state.db, &token)
            .await
            .map_err(|e| {
                tracing::error!("Session lookup failed: {}", e);
                AuthError::Internal
            })?
            .ok_or(AuthError::InvalidToken)?;

        if !user.is_active() {
            return Err(AuthError::InvalidToken);
        }

        if !user.is_admin() {
            return Err(AuthError::NotAdmin);
        }

        Ok(AdminUser { user, token })
    }
}

/// Authentication errors
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    NotAdmin,
    Internal,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Access denied. No token provided.",
            ),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token."),
            AuthError::NotAdmin => (StatusCode::FORBIDDEN, "Admin access required"),
            AuthError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Server error"),
        };

        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}
