use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use super::{like_pattern, paginate, ApiResponse, JsonBody, Paginated, QueryParams};
use crate::error::{AppError, AppResult};
use crate::middleware::AdminUser;
use crate::models::{Page, ProductInput, ProductListQuery, ProductStatus, ProductView, VendorProduct};
use crate::AppState;

// Vendor display name: business name when present, else contact name
const COLUMNS: &str = "vp.*, COALESCE(NULLIF(TRIM(v.business_name), ''), v.name) AS vendor_name";
const FROM: &str = "vendor_products vp LEFT JOIN vendors v ON v.id = vp.vendor_id";

async fn find_product(state: &AppState, id: &str) -> AppResult<VendorProduct> {
    sqlx::query_as(&format!("SELECT {} FROM {} WHERE vp.id = ?", COLUMNS, FROM))
        .bind(id)
        .fetch_optional(state.db.pool())
        .await?
        .ok_or(AppError::ProductNotFound)
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    QueryParams(q): QueryParams<ProductListQuery>,
) -> AppResult<Json<Paginated<ProductView>>> {
    let page = Page::new(q.page, q.limit, &state.config);
    let search = like_pattern(&q.search);

    let (products, total) =
        paginate::<VendorProduct, _>(&state.db, COLUMNS, FROM, "vp.created_at DESC", page, |qb| {
            if let Some(vendor_id) = &q.vendor_id {
                qb.push(" AND vp.vendor_id = ").push_bind(vendor_id.clone());
            }
            if let Some(category) = &q.category {
                qb.push(" AND vp.category = ").push_bind(category.clone());
            }
            if let Some(status) = q.status {
                qb.push(" AND vp.status = ").push_bind(status.as_str());
            }
            if let Some(pattern) = &search {
                qb.push(" AND (vp.name LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR vp.description LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR vp.category LIKE ")
                    .push_bind(pattern.clone())
                    .push(")");
            }
        })
        .await?;

    let base = &state.config.uploads_base_url;
    let views = products.iter().map(|p| p.to_view(base)).collect();
    Ok(Paginated::new(views, total, page))
}

pub async fn categories(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<Vec<String>>>> {
    let categories: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT category FROM vendor_products ORDER BY category")
            .fetch_all(state.db.pool())
            .await?;
    Ok(ApiResponse::ok(categories))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ProductView>>> {
    let product = find_product(&state, &id).await?;
    Ok(ApiResponse::ok(product.to_view(&state.config.uploads_base_url)))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    JsonBody(input): JsonBody<ProductInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProductView>>)> {
    let Some(vendor_id) = input
        .vendor_id
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
    else {
        return Err(AppError::InvalidInput(
            "Missing required fields: vendorId".to_string(),
        ));
    };
    let product = input.validate_new()?;

    let vendor: Option<(String,)> = sqlx::query_as("SELECT id FROM vendors WHERE id = ?")
        .bind(&vendor_id)
        .fetch_optional(state.db.pool())
        .await?;
    if vendor.is_none() {
        return Err(AppError::VendorNotFound);
    }

    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO vendor_products (id, vendor_id, name, description, price, category, image_url,
                                     stock_quantity, status, size, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&vendor_id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(&product.category)
    .bind(&product.image_url)
    .bind(product.stock_quantity)
    .bind(product.status.unwrap_or(ProductStatus::Pending).as_str())
    .bind(&product.size)
    .bind(now)
    .bind(now)
    .execute(state.db.pool())
    .await?;

    tracing::info!(product_id = %id, vendor_id = %vendor_id, "Vendor product created");
    let created = find_product(&state, &id).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            created.to_view(&state.config.uploads_base_url),
            "Vendor product created successfully",
        ),
    ))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ProductInput>,
) -> AppResult<Json<ApiResponse<ProductView>>> {
    let changes = input.validate_changes()?;

    let result = sqlx::query(
        r#"
        UPDATE vendor_products SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            price = COALESCE(?, price),
            category = COALESCE(?, category),
            image_url = COALESCE(?, image_url),
            stock_quantity = COALESCE(?, stock_quantity),
            status = COALESCE(?, status),
            size = COALESCE(?, size),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(changes.name)
    .bind(changes.description)
    .bind(changes.price)
    .bind(changes.category)
    .bind(changes.image_url)
    .bind(changes.stock_quantity)
    .bind(changes.status.map(|s| s.as_str()))
    .bind(changes.size)
    .bind(Utc::now())
    .bind(&id)
    .execute(state.db.pool())
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::ProductNotFound);
    }

    let product = find_product(&state, &id).await?;
    Ok(ApiResponse::with_message(
        product.to_view(&state.config.uploads_base_url),
        "Vendor product updated successfully",
    ))
}

/// Publish a vendor product, recording who approved it and when
pub async fn approve(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ProductView>>> {
    let now = Utc::now();
    let result = sqlx::query(
        "UPDATE vendor_products SET status = ?, approved_by = ?, approved_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(ProductStatus::Active.as_str())
    .bind(&admin.user.id)
    .bind(now)
    .bind(now)
    .bind(&id)
    .execute(state.db.pool())
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::ProductNotFound);
    }

    tracing::info!(product_id = %id, admin_id = %admin.user.id, "Vendor product approved");
    let product = find_product(&state, &id).await?;
    Ok(ApiResponse::with_message(
        product.to_view(&state.config.uploads_base_url),
        "Vendor product approved successfully",
    ))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let result = sqlx::query("DELETE FROM vendor_products WHERE id = ?")
        .bind(&id)
        .execute(state.db.pool())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::ProductNotFound);
    }

    tracing::info!(product_id = %id, "Vendor product deleted");
    Ok(ApiResponse::message("Vendor product deleted successfully"))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use crate::routes::test_support::{admin_token, app, send};

    async fn create_vendor(app: &axum::Router, token: &str) -> String {
        let (_, body) = send(
            app,
            Method::POST,
            "/api/vendors",
            Some(token),
            Some(json!({
                "name": "Jo Smith",
                "email": "jo@crafts.example",
                "phone": "555-0100",
                "address": "1 Main St",
                "businessName": "Jo's Crafts"
            })),
        )
        .await;
        body["data"]["id"].as_str().unwrap().to_string()
    }

    fn lamp(vendor_id: &str) -> Value {
        json!({
            "name": "Lamp",
            "description": "Desk lamp",
            "price": 30,
            "category": "home",
            "stock": 4,
            "size": "M",
            "vendorId": vendor_id
        })
    }

    #[tokio::test]
    async fn vendor_products_start_pending_until_approved() {
        let (app, state) = app().await;
        let token = admin_token(&state).await;
        let vendor_id = create_vendor(&app, &token).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/vendor/products",
            Some(&token),
            Some(lamp(&vendor_id)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["vendorName"], "Jo's Crafts");
        assert_eq!(body["data"]["size"], "M");
        assert!(body["data"]["images"].as_array().unwrap().is_empty());
        assert!(body["data"].get("approvedBy").is_none());
        assert!(body["data"].get("createdBy").is_none());
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/vendor/products/{}/approve", id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "active");
        assert!(body["data"]["approvedBy"].is_string());
        assert!(body["data"]["approvedAt"].is_string());

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/vendor/products?vendorId={}&status=active", vendor_id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
    }

    #[tokio::test]
    async fn vendor_product_requires_known_vendor() {
        let (app, state) = app().await;
        let token = admin_token(&state).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/vendor/products",
            Some(&token),
            Some(lamp("nobody")),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Vendor not found");

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/vendor/products/missing/approve",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn removed_vendor_shows_as_unknown() {
        let (app, state) = app().await;
        let token = admin_token(&state).await;
        let vendor_id = create_vendor(&app, &token).await;

        let (_, body) = send(
            &app,
            Method::POST,
            "/api/vendor/products",
            Some(&token),
            Some(lamp(&vendor_id)),
        )
        .await;
        let id = body["data"]["id"].as_str().unwrap().to_string();

        send(&app, Method::DELETE, &format!("/api/vendors/{}", vendor_id), Some(&token), None).await;

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/vendor/products/{}", id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["vendorName"], "Unknown Vendor");
    }
}
