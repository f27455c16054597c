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
use crate::models::{AdminProduct, Page, ProductInput, ProductListQuery, ProductStatus, ProductView};
use crate::AppState;

async fn find_product(state: &AppState, id: &str) -> AppResult<AdminProduct> {
    sqlx::query_as("SELECT * FROM admin_products WHERE id = ?")
        .bind(id)
        .fetch_optional(state.db.pool())
        .await?
        .ok_or(AppError::ProductNotFound)
}

/// List admin products
pub async fn index(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    QueryParams(q): QueryParams<ProductListQuery>,
) -> AppResult<Json<Paginated<ProductView>>> {
    let page = Page::new(q.page, q.limit, &state.config);
    let search = like_pattern(&q.search);

    let (products, total) = paginate::<AdminProduct, _>(
        &state.db,
        "*",
        "admin_products",
        "created_at DESC",
        page,
        |qb| {
            if let Some(category) = &q.category {
                qb.push(" AND category = ").push_bind(category.clone());
            }
            if let Some(status) = q.status {
                qb.push(" AND status = ").push_bind(status.as_str());
            }
            if let Some(pattern) = &search {
                qb.push(" AND (name LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR description LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR category LIKE ")
                    .push_bind(pattern.clone())
                    .push(")");
            }
        },
    )
    .await?;

    let base = &state.config.uploads_base_url;
    let views = products.iter().map(|p| p.to_view(base)).collect();
    Ok(Paginated::new(views, total, page))
}

pub async fn categories(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<Vec<String>>>> {
    let categories: Vec<String> = sqlx::query_scalar("SELECT DISTINCT category FROM admin_products ORDER BY category")
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
    admin: AdminUser,
    JsonBody(input): JsonBody<ProductInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProductView>>)> {
    let product = input.validate_new()?;
    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO admin_products (id, name, description, price, category, image_url,
                                    stock_quantity, status, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(&product.category)
    .bind(&product.image_url)
    .bind(product.stock_quantity)
    .bind(product.status.unwrap_or(ProductStatus::Active).as_str())
    .bind(&admin.user.id)
    .bind(now)
    .bind(now)
    .execute(state.db.pool())
    .await?;

    tracing::info!(product_id = %id, admin_id = %admin.user.id, "Admin product created");
    let created = find_product(&state, &id).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            created.to_view(&state.config.uploads_base_url),
            "Admin product created successfully",
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
        UPDATE admin_products SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            price = COALESCE(?, price),
            category = COALESCE(?, category),
            image_url = COALESCE(?, image_url),
            stock_quantity = COALESCE(?, stock_quantity),
            status = COALESCE(?, status),
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
        "Admin product updated successfully",
    ))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let result = sqlx::query("DELETE FROM admin_products WHERE id = ?")
        .bind(&id)
        .execute(state.db.pool())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::ProductNotFound);
    }

    tracing::info!(product_id = %id, "Admin product deleted");
    Ok(ApiResponse::message("Admin product deleted successfully"))
}
