use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use super::{paginate, ApiResponse, JsonBody, Paginated, QueryParams};
use crate::error::AppResult;
use crate::middleware::AdminUser;
use crate::models::{
    CreateReportRequest, Page, Report, ReportListQuery, ReportStatus, RespondRequest,
    UpdateReportStatusRequest,
};
use crate::services::ReportService;
use crate::AppState;

/// List reports
pub async fn index(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    QueryParams(q): QueryParams<ReportListQuery>,
) -> AppResult<Json<Paginated<Report>>> {
    let page = Page::new(q.page, q.limit, &state.config);

    let (reports, total) = paginate(&state.db, "*", "reports", "created_at DESC", page, |qb| {
        if let Some(status) = q.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(category) = q.category {
            qb.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(priority) = q.priority {
            qb.push(" AND priority = ").push_bind(priority.as_str());
        }
    })
    .await?;

    let reports = ReportService::with_responses(&state.db, reports).await?;
    Ok(Paginated::new(reports, total, page))
}

pub async fn by_status(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(status): Path<String>,
    QueryParams(q): QueryParams<ReportListQuery>,
) -> AppResult<Json<Paginated<Report>>> {
    let status: ReportStatus = status.parse()?;
    let page = Page::new(q.page, q.limit, &state.config);

    let (reports, total) = paginate(&state.db, "*", "reports", "created_at DESC", page, |qb| {
        qb.push(" AND status = ").push_bind(status.as_str());
    })
    .await?;

    let reports = ReportService::with_responses(&state.db, reports).await?;
    Ok(Paginated::new(reports, total, page))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Report>>> {
    Ok(ApiResponse::ok(ReportService::get(&state.db, &id).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    JsonBody(req): JsonBody<CreateReportRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Report>>)> {
    let report = ReportService::create(&state.db, req).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(report, "Report created successfully"),
    ))
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateReportStatusRequest>,
) -> AppResult<Json<ApiResponse<Report>>> {
    let change = req.into_change(&admin.user.id, Utc::now());
    let report = ReportService::update_status(&state.db, &id, change).await?;
    Ok(ApiResponse::with_message(report, "Report status updated successfully"))
}

pub async fn respond(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<RespondRequest>,
) -> AppResult<Json<ApiResponse<Report>>> {
    let message = req.validated_message()?;
    let report = ReportService::respond(&state.db, &id, &admin.user, message).await?;
    Ok(ApiResponse::with_message(report, "Response added successfully"))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    ReportService::delete(&state.db, &id).await?;
    Ok(ApiResponse::message("Report deleted successfully"))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{admin_token, app, send};
    use crate::services::orders::tests::seed_customer;

    #[tokio::test]
    async fn report_lifecycle_over_http() {
        let (app, state) = app().await;
        let token = admin_token(&state).await;
        let user_id = seed_customer(&state.db).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/reports",
            Some(&token),
            Some(json!({
                "userId": user_id,
                "subject": "Late parcel",
                "message": "Still waiting",
                "category": "shipping_delay"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["priority"], "medium");
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/reports/{}/respond", id),
            Some(&token),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Please provide a response message");

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/reports/{}/respond", id),
            Some(&token),
            Some(json!({ "message": "Courier contacted" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "in_progress");
        assert_eq!(body["data"]["responses"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["responses"][0]["adminName"], "Default Admin");

        let (_, body) = send(
            &app,
            Method::GET,
            "/api/reports/status/in_progress",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(body["total"], 1);

        let (status, _) = send(
            &app,
            Method::GET,
            "/api/reports/status/open",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/reports/{}/status", id),
            Some(&token),
            Some(json!({ "status": "resolved", "priority": "high" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "resolved");
        assert_eq!(body["data"]["priority"], "high");
        assert!(body["data"]["resolvedAt"].is_string());
        assert!(body["data"]["resolvedBy"].is_string());

        let (status, _) =
            send(&app, Method::DELETE, &format!("/api/reports/{}", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) =
            send(&app, Method::GET, &format!("/api/reports/{}", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Report not found");
    }

    #[tokio::test]
    async fn responding_to_missing_report_is_not_found() {
        let (app, state) = app().await;
        let token = admin_token(&state).await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/reports/missing/respond",
            Some(&token),
            Some(json!({ "message": "hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
