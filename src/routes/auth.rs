use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use super::{ApiResponse, JsonBody};
use crate::error::{AppError, AppResult};
use crate::middleware::AdminUser;
use crate::models::{
    is_valid_email, normalize_email, AdminProfile, ChangePasswordRequest, LoginRequest,
    UpdateProfileRequest, User,
};
use crate::services::AuthService;
use crate::AppState;

/// Handle login
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> AppResult<Json<Value>> {
    let (Some(email), Some(password)) = (
        req.email.filter(|e| !e.trim().is_empty()),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::InvalidInput(
            "Please provide email and password".to_string(),
        ));
    };

    let (token, admin) =
        AuthService::login(&state.db, &email, &password, state.config.session_hours).await?;

    Ok(Json(json!({
        "success": true,
        "token": token,
        "admin": AdminProfile::from(&admin),
    })))
}

/// Revoke the presented token
pub async fn logout(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
) -> AppResult<Json<ApiResponse<()>>> {
    AuthService::delete_session(&state.db, &admin.token).await?;
    tracing::info!(admin_id = %admin.user.id, "Admin logged out");
    Ok(ApiResponse::message("Logged out successfully"))
}

pub async fn profile(admin: AdminUser) -> Json<ApiResponse<AdminProfile>> {
    ApiResponse::ok(AdminProfile::from(&admin.user))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<AdminProfile>>> {
    let email = match req.email.as_deref().map(normalize_email) {
        Some(email) if !is_valid_email(&email) => {
            return Err(AppError::InvalidInput(
                "Please provide a valid email".to_string(),
            ))
        }
        Some(email) => {
            let taken: Option<(String,)> =
                sqlx::query_as("SELECT id FROM users WHERE email = ? AND id != ?")
                    .bind(&email)
                    .bind(&admin.user.id)
                    .fetch_optional(state.db.pool())
                    .await?;
            if taken.is_some() {
                return Err(AppError::UserAlreadyExists);
            }
            Some(email)
        }
        None => None,
    };

    sqlx::query(
        r#"
        UPDATE users SET
            name = COALESCE(?, name),
            email = COALESCE(?, email),
            phone = COALESCE(?, phone),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(req.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()))
    .bind(email)
    .bind(req.phone)
    .bind(Utc::now())
    .bind(&admin.user.id)
    .execute(state.db.pool())
    .await?;

    let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&admin.user.id)
        .fetch_optional(state.db.pool())
        .await?
        .ok_or(AppError::UserNotFound)?;

    Ok(ApiResponse::with_message(
        AdminProfile::from(&user),
        "Profile updated successfully",
    ))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    AuthService::change_password(
        &state.db,
        &admin.user,
        req.old_password.as_deref(),
        req.new_password.as_deref(),
    )
    .await?;

    Ok(ApiResponse::message("Password updated successfully"))
}
