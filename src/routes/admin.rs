use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;

use super::{ApiResponse, QueryParams};
use crate::error::AppResult;
use crate::middleware::AdminUser;
use crate::models::{DashboardStats, SalesBucket, SalesDataQuery};
use crate::services::StatsService;
use crate::AppState;

/// Admin dashboard counters
pub async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    Ok(ApiResponse::ok(StatsService::dashboard_stats(&state.db).await?))
}

/// Sales time series for `?period=7d|30d|1y`
pub async fn sales_data(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    QueryParams(q): QueryParams<SalesDataQuery>,
) -> AppResult<Json<ApiResponse<Vec<SalesBucket>>>> {
    let buckets = StatsService::sales_data(&state.db, q.period, Utc::now()).await?;
    Ok(ApiResponse::ok(buckets))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{admin_token, app, send};
    use crate::services::orders::tests::seed_customer;

    #[tokio::test]
    async fn dashboard_reflects_current_data() {
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
                "items": [{ "productId": "p1", "productName": "Mug", "quantity": 2, "price": 20, "vendorId": "v1" }]
            })),
        )
        .await;
        let order_id = body["data"]["id"].as_str().unwrap().to_string();

        let (_, body) =
            send(&app, Method::GET, "/api/admin/dashboard-stats", Some(&token), None).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["totalUsers"], 2);
        assert_eq!(body["data"]["totalOrders"], 1);
        assert_eq!(body["data"]["monthlyRevenue"], 0.0);
        assert_eq!(body["data"]["recentOrders"][0]["customerName"], "Ann Buyer");
        assert_eq!(body["data"]["recentOrders"][0]["status"], "pending");

        send(
            &app,
            Method::PUT,
            &format!("/api/orders/{}/payment-status", order_id),
            Some(&token),
            Some(json!({ "paymentStatus": "completed" })),
        )
        .await;

        let (status, body) =
            send(&app, Method::GET, "/api/admin/dashboard-stats", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["monthlyRevenue"], 40.0);
    }

    #[tokio::test]
    async fn sales_data_buckets_delivered_orders() {
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
                "items": [{ "productId": "p1", "productName": "Mug", "quantity": 1, "price": 15, "vendorId": "v1" }]
            })),
        )
        .await;
        let order_id = body["data"]["id"].as_str().unwrap().to_string();

        let (_, body) =
            send(&app, Method::GET, "/api/admin/sales-data", Some(&token), None).await;
        assert!(body["data"].as_array().unwrap().is_empty());

        send(
            &app,
            Method::PUT,
            &format!("/api/orders/{}/status", order_id),
            Some(&token),
            Some(json!({ "status": "delivered" })),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/admin/sales-data?period=30d",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["sales"], 15.0);
        assert_eq!(body["data"][0]["orders"], 1);
        assert_eq!(body["data"][0]["bucketKey"].as_str().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn unknown_sales_period_is_rejected() {
        let (app, state) = app().await;
        let token = admin_token(&state).await;

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/admin/sales-data?period=2w",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}
