use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sqlx::types::Json as SqlJson;

use super::{paginate, ApiResponse, JsonBody, Paginated, QueryParams};
use crate::error::{AppError, AppResult};
use crate::middleware::AdminUser;
use crate::models::{
    is_valid_email, normalize_email, CreateVendorRequest, Page, UpdateVendorRequest, Vendor,
    VendorListQuery, VendorStatus,
};
use crate::AppState;

async fn find_vendor(state: &AppState, id: &str) -> AppResult<Vendor> {
    sqlx::query_as("SELECT * FROM vendors WHERE id = ?")
        .bind(id)
        .fetch_optional(state.db.pool())
        .await?
        .ok_or(AppError::VendorNotFound)
}

async fn checked_email(state: &AppState, email: &str, except_id: &str) -> AppResult<String> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::InvalidInput(
            "Please provide a valid email".to_string(),
        ));
    }

    let taken: Option<(String,)> = sqlx::query_as("SELECT id FROM vendors WHERE email = ? AND id != ?")
        .bind(&email)
        .bind(except_id)
        .fetch_optional(state.db.pool())
        .await?;
    if taken.is_some() {
        return Err(AppError::VendorAlreadyExists);
    }

    Ok(email)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    QueryParams(q): QueryParams<VendorListQuery>,
) -> AppResult<Json<Paginated<Vendor>>> {
    let page = Page::new(q.page, q.limit, &state.config);

    let (vendors, total) = paginate(&state.db, "*", "vendors", "created_at DESC", page, |qb| {
        if let Some(status) = q.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
    })
    .await?;

    Ok(Paginated::new(vendors, total, page))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Vendor>>> {
    Ok(ApiResponse::ok(find_vendor(&state, &id).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    JsonBody(req): JsonBody<CreateVendorRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Vendor>>)> {
    let (name, phone, address) = (req.name.trim(), req.phone.trim(), req.address.trim());
    if name.is_empty() || phone.is_empty() || address.is_empty() {
        return Err(AppError::InvalidInput(
            "Please provide name, email, phone and address".to_string(),
        ));
    }
    let email = checked_email(&state, &req.email, "").await?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO vendors (id, name, email, phone, address, business_name, business_type, tax_id,
                             status, documents, bank_details, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(name)
    .bind(&email)
    .bind(phone)
    .bind(address)
    .bind(&req.business_name)
    .bind(&req.business_type)
    .bind(&req.tax_id)
    .bind(req.status.unwrap_or(VendorStatus::Pending).as_str())
    .bind(SqlJson(&req.documents))
    .bind(req.bank_details.as_ref().map(SqlJson))
    .bind(now)
    .bind(now)
    .execute(state.db.pool())
    .await?;

    tracing::info!(vendor_id = %id, "Vendor created");
    let vendor = find_vendor(&state, &id).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(vendor, "Vendor created successfully"),
    ))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateVendorRequest>,
) -> AppResult<Json<ApiResponse<Vendor>>> {
    let email = match req.email.as_deref() {
        Some(email) => Some(checked_email(&state, email, &id).await?),
        None => None,
    };

    let result = sqlx::query(
        r#"
        UPDATE vendors SET
            name = COALESCE(?, name),
            email = COALESCE(?, email),
            phone = COALESCE(?, phone),
            address = COALESCE(?, address),
            business_name = COALESCE(?, business_name),
            business_type = COALESCE(?, business_type),
            tax_id = COALESCE(?, tax_id),
            status = COALESCE(?, status),
            documents = COALESCE(?, documents),
            bank_details = COALESCE(?, bank_details),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(trimmed(req.name))
    .bind(email)
    .bind(trimmed(req.phone))
    .bind(trimmed(req.address))
    .bind(req.business_name)
    .bind(req.business_type)
    .bind(req.tax_id)
    .bind(req.status.map(|s| s.as_str()))
    .bind(req.documents.map(SqlJson))
    .bind(req.bank_details.map(SqlJson))
    .bind(Utc::now())
    .bind(&id)
    .execute(state.db.pool())
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::VendorNotFound);
    }

    if let Some(status) = req.status {
        tracing::info!(vendor_id = %id, status = status.as_str(), "Vendor status updated");
    }

    let vendor = find_vendor(&state, &id).await?;
    Ok(ApiResponse::with_message(vendor, "Vendor updated successfully"))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let result = sqlx::query("DELETE FROM vendors WHERE id = ?")
        .bind(&id)
        .execute(state.db.pool())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::VendorNotFound);
    }

    tracing::info!(vendor_id = %id, "Vendor deleted");
    Ok(ApiResponse::message("Vendor deleted successfully"))
}
