use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use super::{paginate, ApiResponse, JsonBody, Paginated, QueryParams};
use crate::error::{AppError, AppResult};
use crate::middleware::AdminUser;
use crate::models::{
    is_valid_email, normalize_email, CreateUserRequest, Page, UpdateUserRequest, User,
    UserListQuery, UserRole, UserStatus,
};
use crate::services::AuthService;
use crate::AppState;

async fn find_user(state: &AppState, id: &str) -> AppResult<User> {
    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(state.db.pool())
        .await?
        .ok_or(AppError::UserNotFound)
}

async fn ensure_email_free(state: &AppState, email: &str, except_id: Option<&str>) -> AppResult<()> {
    let taken: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ? AND id != ?")
        .bind(email)
        .bind(except_id.unwrap_or(""))
        .fetch_optional(state.db.pool())
        .await?;

    match taken {
        Some(_) => Err(AppError::UserAlreadyExists),
        None => Ok(()),
    }
}

fn checked_email(email: &str) -> AppResult<String> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::InvalidInput(
            "Please provide a valid email".to_string(),
        ));
    }
    Ok(email)
}

/// List users
pub async fn index(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    QueryParams(q): QueryParams<UserListQuery>,
) -> AppResult<Json<Paginated<User>>> {
    let page = Page::new(q.page, q.limit, &state.config);

    let (users, total) = paginate(&state.db, "*", "users", "created_at DESC", page, |qb| {
        if let Some(role) = q.role {
            qb.push(" AND role = ").push_bind(role.as_str());
        }
        if let Some(status) = q.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
    })
    .await?;

    Ok(Paginated::new(users, total, page))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<User>>> {
    Ok(ApiResponse::ok(find_user(&state, &id).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Name is required".to_string()));
    }
    if req.password.len() < 6 {
        return Err(AppError::InvalidInput(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    let email = checked_email(&req.email)?;
    ensure_email_free(&state, &email, None).await?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, phone, role, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(name)
    .bind(&email)
    .bind(AuthService::hash_password(&req.password)?)
    .bind(&req.phone)
    .bind(req.role.unwrap_or(UserRole::User).as_str())
    .bind(req.status.unwrap_or(UserStatus::Active).as_str())
    .bind(now)
    .bind(now)
    .execute(state.db.pool())
    .await?;

    tracing::info!(user_id = %id, "User created");
    let user = find_user(&state, &id).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(user, "User created successfully"),
    ))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let email = match req.email.as_deref() {
        Some(email) => {
            let email = checked_email(email)?;
            ensure_email_free(&state, &email, Some(&id)).await?;
            Some(email)
        }
        None => None,
    };

    let result = sqlx::query(
        r#"
        UPDATE users SET
            name = COALESCE(?, name),
            email = COALESCE(?, email),
            phone = COALESCE(?, phone),
            role = COALESCE(?, role),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(req.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()))
    .bind(email)
    .bind(req.phone)
    .bind(req.role.map(|r| r.as_str()))
    .bind(req.status.map(|s| s.as_str()))
    .bind(Utc::now())
    .bind(&id)
    .execute(state.db.pool())
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::UserNotFound);
    }

    let user = find_user(&state, &id).await?;
    Ok(ApiResponse::with_message(user, "User updated successfully"))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    if admin.user.id == id {
        return Err(AppError::InvalidInput(
            "You cannot delete your own account".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&id)
        .execute(state.db.pool())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::UserNotFound);
    }

    tracing::info!(user_id = %id, "User deleted");
    Ok(ApiResponse::message("User deleted successfully"))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{admin_token, app, send};

    #[tokio::test]
    async fn user_crud() {
        let (app, state) = app().await;
        let token = admin_token(&state).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/users",
            Some(&token),
            Some(json!({ "name": "Bo", "email": "Bo@Example.com", "password": "hunter22" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["email"], "bo@example.com");
        assert_eq!(body["data"]["role"], "user");
        assert!(body["data"].get("passwordHash").is_none());
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/users",
            Some(&token),
            Some(json!({ "name": "Bo2", "email": "bo@example.com", "password": "hunter22" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User with this email already exists");

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/users/{}", id),
            Some(&token),
            Some(json!({ "status": "blocked" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "blocked");
        assert_eq!(body["data"]["name"], "Bo");

        let (status, body) = send(&app, Method::GET, "/api/users?role=user", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["pages"], 1);

        let (status, _) =
            send(&app, Method::DELETE, &format!("/api/users/{}", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            send(&app, Method::GET, &format!("/api/users/{}", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");
    }

    #[tokio::test]
    async fn list_paginates() {
        let (app, state) = app().await;
        let token = admin_token(&state).await;

        for i in 0..3 {
            send(
                &app,
                Method::POST,
                "/api/users",
                Some(&token),
                Some(json!({ "name": format!("U{}", i), "email": format!("u{}@example.com", i), "password": "secret1" })),
            )
            .await;
        }

        let (status, body) = send(&app, Method::GET, "/api/users?page=2&limit=2", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 4);
        assert_eq!(body["pages"], 2);
        assert_eq!(body["page"], 2);
        assert_eq!(body["count"], 2);
    }
}
