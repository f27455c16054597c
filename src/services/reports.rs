use chrono::Utc;

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateReportRequest, Report, ReportResponse, ReportStatus, ReportStatusChange, User,
};

/// Support ticket lifecycle: creation, status updates and the response log
pub struct ReportService;

impl ReportService {
    /// Load a report with its responses in insertion order
    pub async fn get(db: &Database, report_id: &str) -> AppResult<Report> {
        let mut report: Report = sqlx::query_as("SELECT * FROM reports WHERE id = ?")
            .bind(report_id)
            .fetch_optional(db.pool())
            .await?
            .ok_or(AppError::ReportNotFound)?;

        report.responses = Self::responses(db, report_id).await?;
        Ok(report)
    }

    async fn responses(db: &Database, report_id: &str) -> AppResult<Vec<ReportResponse>> {
        let responses = sqlx::query_as(
            r#"
            SELECT admin_id, admin_name, message, timestamp
            FROM report_responses WHERE report_id = ? ORDER BY seq
            "#,
        )
        .bind(report_id)
        .fetch_all(db.pool())
        .await?;
        Ok(responses)
    }

    pub async fn with_responses(db: &Database, mut reports: Vec<Report>) -> AppResult<Vec<Report>> {
        for report in reports.iter_mut() {
            report.responses = Self::responses(db, &report.id).await?;
        }
        Ok(reports)
    }

    /// Open a ticket, snapshotting the reporting user's name and email
    pub async fn create(db: &Database, req: CreateReportRequest) -> AppResult<Report> {
        let subject = req.subject.trim();
        let message = req.message.trim();
        if subject.is_empty() || message.is_empty() {
            return Err(AppError::InvalidInput(
                "Please provide subject and message".to_string(),
            ));
        }

        let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(&req.user_id)
            .fetch_optional(db.pool())
            .await?
            .ok_or(AppError::UserNotFound)?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO reports (id, user_id, user_name, user_email, subject, message, category,
                                 priority, status, order_id, product_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(subject)
        .bind(message)
        .bind(req.category.map(|c| c.as_str()).unwrap_or("other"))
        .bind(req.priority.unwrap_or_default().as_str())
        .bind(&req.order_id)
        .bind(&req.product_id)
        .bind(now)
        .bind(now)
        .execute(db.pool())
        .await?;

        tracing::info!(report_id = %id, "Report created");
        Self::get(db, &id).await
    }

    /// Apply a partial status update; omitted fields keep their values
    pub async fn update_status(
        db: &Database,
        report_id: &str,
        change: ReportStatusChange,
    ) -> AppResult<Report> {
        let result = sqlx::query(
            r#"
            UPDATE reports SET
                status = COALESCE(?, status),
                assigned_to = COALESCE(?, assigned_to),
                priority = COALESCE(?, priority),
                resolved_at = COALESCE(?, resolved_at),
                resolved_by = COALESCE(?, resolved_by),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(change.status.map(|s| s.as_str()))
        .bind(&change.assigned_to)
        .bind(change.priority.map(|p| p.as_str()))
        .bind(change.resolved_at)
        .bind(&change.resolved_by)
        .bind(Utc::now())
        .bind(report_id)
        .execute(db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ReportNotFound);
        }

        if let Some(status) = change.status {
            tracing::info!(report_id, status = status.as_str(), "Report status updated");
        }
        Self::get(db, report_id).await
    }

    /// Append an admin response. A pending report moves to in_progress;
    /// any other status is left as stored.
    pub async fn respond(
        db: &Database,
        report_id: &str,
        admin: &User,
        message: String,
    ) -> AppResult<Report> {
        let now = Utc::now();
        let mut tx = db.pool().begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE reports SET
                status = CASE WHEN status = ? THEN ? ELSE status END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(ReportStatus::Pending.as_str())
        .bind(ReportStatus::Pending.after_response().as_str())
        .bind(now)
        .bind(report_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ReportNotFound);
        }

        sqlx::query(
            "INSERT INTO report_responses (report_id, admin_id, admin_name, message, timestamp) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(report_id)
        .bind(&admin.id)
        .bind(&admin.name)
        .bind(&message)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(report_id, admin_id = %admin.id, "Report response added");
        Self::get(db, report_id).await
    }

    pub async fn delete(db: &Database, report_id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM reports WHERE id = ?")
            .bind(report_id)
            .execute(db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ReportNotFound);
        }

        tracing::info!(report_id, "Report deleted");
        Ok(())
    }
}
