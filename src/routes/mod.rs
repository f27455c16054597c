pub mod admin;
pub mod admin_products;
pub mod auth;
pub mod orders;
pub mod reports;
pub mod users;
pub mod vendor_products;
pub mod vendors;

use std::sync::Arc;

use axum::{
    extract::{FromRequest, FromRequestParts, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, Sqlite};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::Page;
use crate::AppState;

/// JSON body extractor whose rejections render as `AppError`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Query string extractor whose rejections render as `AppError`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// Standard success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
            data: Some(data),
        })
    }

    pub fn with_message(data: T, message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.to_string()),
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    pub fn message(message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.to_string()),
            data: None,
        })
    }
}

/// List envelope with pagination counters
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub success: bool,
    pub count: usize,
    pub total: i64,
    pub page: u32,
    pub pages: i64,
    pub data: Vec<T>,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, page: Page) -> Json<Self> {
        Json(Self {
            success: true,
            count: data.len(),
            total,
            page: page.page,
            pages: page.pages(total),
            data,
        })
    }
}

/// Run a filtered page query plus its matching count.
///
/// `filter` appends `AND ...` clauses; it is applied to both queries.
pub(crate) async fn paginate<T, F>(
    db: &Database,
    columns: &str,
    from: &str,
    order_by: &str,
    page: Page,
    filter: F,
) -> AppResult<(Vec<T>, i64)>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    F: for<'a> Fn(&mut QueryBuilder<'a, Sqlite>),
{
    let mut count = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {} WHERE 1 = 1", from));
    filter(&mut count);
    let total: i64 = count.build_query_scalar().fetch_one(db.pool()).await?;

    let mut rows = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM {} WHERE 1 = 1", columns, from));
    filter(&mut rows);
    rows.push(format!(" ORDER BY {} LIMIT ", order_by))
        .push_bind(page.limit as i64)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let items = rows.build_query_as::<T>().fetch_all(db.pool()).await?;

    Ok((items, total))
}

/// `%term%` pattern for LIKE searches; `None` for blank input
pub(crate) fn like_pattern(term: &Option<String>) -> Option<String> {
    term.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| format!("%{}%", t))
}

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let database = if state.db.ping().await {
        "connected"
    } else {
        "disconnected"
    };

    Json(json!({
        "status": "OK",
        "database": database,
        "timestamp": Utc::now(),
    }))
}

/// Assemble the HTTP API
pub fn router(state: Arc<AppState>) -> Router {
    let cors = if state.config.cors_allow_any_origin {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/api/health", get(health))
        // Admin session and profile
        .route("/api/admin/login", post(auth::login))
        .route("/api/admin/logout", post(auth::logout))
        .route("/api/admin/profile", get(auth::profile).put(auth::update_profile))
        .route("/api/admin/change-password", post(auth::change_password))
        // Dashboard
        .route("/api/admin/dashboard-stats", get(admin::dashboard_stats))
        .route("/api/admin/sales-data", get(admin::sales_data))
        // Admin catalog
        .route(
            "/api/admin/products",
            get(admin_products::index).post(admin_products::create),
        )
        .route("/api/admin/products/categories", get(admin_products::categories))
        .route(
            "/api/admin/products/:id",
            get(admin_products::show)
                .put(admin_products::update)
                .delete(admin_products::destroy),
        )
        // Vendor catalog
        .route(
            "/api/vendor/products",
            get(vendor_products::index).post(vendor_products::create),
        )
        .route("/api/vendor/products/categories", get(vendor_products::categories))
        .route(
            "/api/vendor/products/:id",
            get(vendor_products::show)
                .put(vendor_products::update)
                .delete(vendor_products::destroy),
        )
        .route("/api/vendor/products/:id/approve", put(vendor_products::approve))
        // Users
        .route("/api/users", get(users::index).post(users::create))
        .route(
            "/api/users/:id",
            get(users::show).put(users::update).delete(users::destroy),
        )
        // Vendors
        .route("/api/vendors", get(vendors::index).post(vendors::create))
        .route(
            "/api/vendors/:id",
            get(vendors::show).put(vendors::update).delete(vendors::destroy),
        )
        // Orders
        .route("/api/orders", get(orders::index).post(orders::create))
        .route("/api/orders/customer/:customer_id", get(orders::by_customer))
        .route("/api/orders/vendor/:vendor_id", get(orders::by_vendor))
        .route("/api/orders/:id", get(orders::show).delete(orders::destroy))
        .route("/api/orders/:id/status", put(orders::update_status))
        .route("/api/orders/:id/payment-status", put(orders::update_payment_status))
        .route("/api/orders/:id/items", put(orders::replace_items))
        // Reports
        .route("/api/reports", get(reports::index).post(reports::create))
        .route("/api/reports/status/:status", get(reports::by_status))
        .route("/api/reports/:id", get(reports::show).delete(reports::destroy))
        .route("/api/reports/:id/status", put(reports::update_status))
        .route("/api/reports/:id/respond", post(reports::respond))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::db::Database;
    use crate::services::AuthService;
    use crate::AppState;

    /// Router over a fresh in-memory database with the default admin provisioned
    pub async fn app() -> (Router, Arc<AppState>) {
        let db = Database::connect_in_memory().await.unwrap();
        let config = Config::default();
        AuthService::ensure_default_admin(&db, &config.default_admin)
            .await
            .unwrap();
        let state = Arc::new(AppState { db, config });
        (super::router(state.clone()), state)
    }

    pub async fn admin_token(state: &AppState) -> String {
        let (token, _) = AuthService::login(
            &state.db,
            &state.config.default_admin.email,
            &state.config.default_admin.password,
            1,
        )
        .await
        .unwrap();
        token
    }

    /// Send a request and decode the JSON response body
    pub async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use super::test_support::{admin_token, app, send};

    #[tokio::test]
    async fn health_reports_database_state() {
        let (app, _) = app().await;
        let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn protected_routes_require_a_bearer_token() {
        let (app, _) = app().await;

        let (status, body) = send(&app, Method::GET, "/api/orders", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Access denied. No token provided.");

        let (status, body) = send(&app, Method::GET, "/api/orders", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid token.");
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let (app, state) = app().await;
        let token = admin_token(&state).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/orders/abc/status",
            Some(&token),
            Some(serde_json::json!({ "status": "lost" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}
