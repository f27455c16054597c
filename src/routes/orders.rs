use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

use super::{paginate, ApiResponse, JsonBody, Paginated, QueryParams};
use crate::error::AppResult;
use crate::middleware::AdminUser;
use crate::models::{
    CreateOrderRequest, Order, OrderListQuery, Page, ReplaceItemsRequest,
    UpdateOrderStatusRequest, UpdatePaymentStatusRequest,
};
use crate::services::OrderService;
use crate::AppState;

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, q: &OrderListQuery) {
    if let Some(status) = q.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(payment_status) = q.payment_status {
        qb.push(" AND payment_status = ").push_bind(payment_status.as_str());
    }
}

async fn list(
    state: &AppState,
    q: &OrderListQuery,
    scope: impl for<'a> Fn(&mut QueryBuilder<'a, Sqlite>),
) -> AppResult<Json<Paginated<Order>>> {
    let page = Page::new(q.page, q.limit, &state.config);

    let (orders, total) = paginate(&state.db, "*", "orders", "created_at DESC", page, |qb| {
        scope(qb);
        push_filters(qb, q);
    })
    .await?;

    let orders = OrderService::with_items(&state.db, orders).await?;
    Ok(Paginated::new(orders, total, page))
}

/// List orders
pub async fn index(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    QueryParams(q): QueryParams<OrderListQuery>,
) -> AppResult<Json<Paginated<Order>>> {
    list(&state, &q, |_| {}).await
}

pub async fn by_customer(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(customer_id): Path<String>,
    QueryParams(q): QueryParams<OrderListQuery>,
) -> AppResult<Json<Paginated<Order>>> {
    list(&state, &q, |qb| {
        qb.push(" AND customer_id = ").push_bind(customer_id.clone());
    })
    .await
}

/// Orders containing at least one line item from the vendor
pub async fn by_vendor(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(vendor_id): Path<String>,
    QueryParams(q): QueryParams<OrderListQuery>,
) -> AppResult<Json<Paginated<Order>>> {
    list(&state, &q, |qb| {
        qb.push(" AND EXISTS (SELECT 1 FROM order_items oi WHERE oi.order_id = orders.id AND oi.vendor_id = ")
            .push_bind(vendor_id.clone())
            .push(")");
    })
    .await
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(ApiResponse::ok(OrderService::get(&state.db, &id).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    JsonBody(req): JsonBody<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let order = OrderService::create(&state.db, req).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(order, "Order created successfully"),
    ))
}

pub async fn replace_items(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<ReplaceItemsRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = OrderService::replace_items(&state.db, &id, req.items).await?;
    Ok(ApiResponse::with_message(order, "Order items updated successfully"))
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = OrderService::update_status(&state.db, &id, req.into_change(Utc::now())).await?;
    Ok(ApiResponse::with_message(order, "Order status updated successfully"))
}

pub async fn update_payment_status(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdatePaymentStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = OrderService::update_payment_status(&state.db, &id, req).await?;
    Ok(ApiResponse::with_message(order, "Payment status updated successfully"))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    OrderService::delete(&state.db, &id).await?;
    Ok(ApiResponse::message("Order deleted successfully"))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{admin_token, app, send};
    use crate::services::orders::tests::seed_customer;

    #[tokio::test]
    async fn order_lifecycle_over_http() {
        let (app, state) = app().await;
        let token = admin_token(&state).await;
        let customer_id = seed_customer(&state.db).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/orders",
            Some(&token),
            Some(json!({
                "customerId": customer_id,
                "items": [
                    { "productId": "p1", "productName": "Mug", "quantity": 2, "price": 100, "vendorId": "v1" },
                    { "productId": "p2", "productName": "Lamp", "quantity": 1, "price": 50, "vendorId": "v2" }
                ],
                "shippingAddress": { "city": "Lisbon" }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["totalAmount"], 250.0);
        assert_eq!(body["data"]["customerName"], "Ann Buyer");
        assert_eq!(body["data"]["shippingAddress"]["city"], "Lisbon");
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/orders/{}/status", id),
            Some(&token),
            Some(json!({ "status": "shipped", "trackingNumber": "TRK-9" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "shipped");
        assert_eq!(body["data"]["trackingNumber"], "TRK-9");
        assert!(body["data"]["deliveredAt"].is_null());

        let (status, body) =
            send(&app, Method::DELETE, &format!("/api/orders/{}", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Only cancelled orders can be deleted");

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/orders/{}/status", id),
            Some(&token),
            Some(json!({ "status": "delivered" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["deliveredAt"].is_string());

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/orders/{}/payment-status", id),
            Some(&token),
            Some(json!({ "paymentStatus": "completed", "paymentId": "pay_1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["paymentStatus"], "completed");

        let (status, body) =
            send(&app, Method::GET, "/api/orders/vendor/v2", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["items"].as_array().unwrap().len(), 2);

        let (_, body) = send(&app, Method::GET, "/api/orders/vendor/v9", Some(&token), None).await;
        assert_eq!(body["total"], 0);

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/api/orders/customer/{}?status=delivered", customer_id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(body["total"], 1);

        send(
            &app,
            Method::PUT,
            &format!("/api/orders/{}/status", id),
            Some(&token),
            Some(json!({ "status": "cancelled" })),
        )
        .await;
        let (status, _) =
            send(&app, Method::DELETE, &format!("/api/orders/{}", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            send(&app, Method::GET, &format!("/api/orders/{}", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Order not found");
    }

    #[tokio::test]
    async fn replacing_items_with_empty_list_keeps_total() {
        let (app, state) = app().await;
        let token = admin_token(&state).await;
        let customer_id = seed_customer(&state.db).await;

        let (_, body) = send(
            &app,
            Method::POST,
            "/api/orders",
            Some(&token),
            Some(json!({
                "customerId": customer_id,
                "items": [{ "productId": "p1", "productName": "Mug", "quantity": 3, "price": 4.5, "vendorId": "v1" }]
            })),
        )
        .await;
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/orders/{}/items", id),
            Some(&token),
            Some(json!({ "items": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totalAmount"], 13.5);
        assert!(body["data"]["items"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_update_on_missing_order_is_not_found() {
        let (app, state) = app().await;
        let token = admin_token(&state).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/orders/missing/status",
            Some(&token),
            Some(json!({ "status": "processing" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }
}
