use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    OrderIssue,
    ProductQuality,
    ShippingDelay,
    PaymentIssue,
    TechnicalSupport,
    Other,
}

impl ReportCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportCategory::OrderIssue => "order_issue",
            ReportCategory::ProductQuality => "product_quality",
            ReportCategory::ShippingDelay => "shipping_delay",
            ReportCategory::PaymentIssue => "payment_issue",
            ReportCategory::TechnicalSupport => "technical_support",
            ReportCategory::Other => "other",
        }
    }
}

impl From<String> for ReportCategory {
    fn from(s: String) -> Self {
        match s.as_str() {
            "order_issue" => ReportCategory::OrderIssue,
            "product_quality" => ReportCategory::ProductQuality,
            "shipping_delay" => ReportCategory::ShippingDelay,
            "payment_issue" => ReportCategory::PaymentIssue,
            "technical_support" => ReportCategory::TechnicalSupport,
            _ => ReportCategory::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl ReportPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPriority::Low => "low",
            ReportPriority::Medium => "medium",
            ReportPriority::High => "high",
            ReportPriority::Urgent => "urgent",
        }
    }
}

impl From<String> for ReportPriority {
    fn from(s: String) -> Self {
        match s.as_str() {
            "low" => ReportPriority::Low,
            "high" => ReportPriority::High,
            "urgent" => ReportPriority::Urgent,
            _ => ReportPriority::Medium,
        }
    }
}

/// Support ticket status. Transitions are unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    InProgress,
    Resolved,
    Closed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::InProgress => "in_progress",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Closed => "closed",
        }
    }

    /// Status after an admin response is appended
    pub fn after_response(self) -> Self {
        match self {
            ReportStatus::Pending => ReportStatus::InProgress,
            other => other,
        }
    }
}

impl From<String> for ReportStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "in_progress" => ReportStatus::InProgress,
            "resolved" => ReportStatus::Resolved,
            "closed" => ReportStatus::Closed,
            _ => ReportStatus::Pending,
        }
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "in_progress" => Ok(ReportStatus::InProgress),
            "resolved" => Ok(ReportStatus::Resolved),
            "closed" => Ok(ReportStatus::Closed),
            other => Err(AppError::InvalidInput(format!(
                "Invalid report status: {}",
                other
            ))),
        }
    }
}

/// One entry in a report's append-only response log
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub admin_id: String,
    pub admin_name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Report model
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub subject: String,
    pub message: String,
    #[sqlx(try_from = "String")]
    pub category: ReportCategory,
    #[sqlx(try_from = "String")]
    pub priority: ReportPriority,
    #[sqlx(try_from = "String")]
    pub status: ReportStatus,
    pub order_id: Option<String>,
    pub product_id: Option<String>,
    pub assigned_to: Option<String>,
    #[sqlx(skip)]
    pub responses: Vec<ReportResponse>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `PUT /reports/:id/status` body; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportStatusRequest {
    pub status: Option<ReportStatus>,
    pub assigned_to: Option<String>,
    pub priority: Option<ReportPriority>,
}

/// Column values written by a status update; `None` keeps the stored value
#[derive(Debug, Clone, PartialEq)]
pub struct ReportStatusChange {
    pub status: Option<ReportStatus>,
    pub assigned_to: Option<String>,
    pub priority: Option<ReportPriority>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}

impl UpdateReportStatusRequest {
    /// Resolve side effects: `resolved` stamps the time and acting admin
    pub fn into_change(self, admin_id: &str, now: DateTime<Utc>) -> ReportStatusChange {
        let resolving = self.status == Some(ReportStatus::Resolved);
        ReportStatusChange {
            status: self.status,
            assigned_to: self.assigned_to,
            priority: self.priority,
            resolved_at: resolving.then_some(now),
            resolved_by: resolving.then(|| admin_id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RespondRequest {
    pub message: Option<String>,
}

impl RespondRequest {
    pub fn validated_message(&self) -> AppResult<String> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::InvalidInput("Please provide a response message".to_string()))
    }
}

/// Create report request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub user_id: String,
    pub subject: String,
    pub message: String,
    pub category: Option<ReportCategory>,
    pub priority: Option<ReportPriority>,
    pub order_id: Option<String>,
    pub product_id: Option<String>,
}

/// Filters for report lists
#[derive(Debug, Clone, Deserialize)]
pub struct ReportListQuery {
    pub status: Option<ReportStatus>,
    pub category: Option<ReportCategory>,
    pub priority: Option<ReportPriority>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_response_moves_pending_to_in_progress() {
        assert_eq!(ReportStatus::Pending.after_response(), ReportStatus::InProgress);
        assert_eq!(ReportStatus::InProgress.after_response(), ReportStatus::InProgress);
    }

    #[test]
    fn responses_do_not_reopen_finished_reports() {
        assert_eq!(ReportStatus::Resolved.after_response(), ReportStatus::Resolved);
        assert_eq!(ReportStatus::Closed.after_response(), ReportStatus::Closed);
    }

    #[test]
    fn resolving_stamps_time_and_admin() {
        let now = Utc::now();
        let change = UpdateReportStatusRequest {
            status: Some(ReportStatus::Resolved),
            ..Default::default()
        }
        .into_change("a1", now);
        assert_eq!(change.resolved_at, Some(now));
        assert_eq!(change.resolved_by.as_deref(), Some("a1"));
    }

    #[test]
    fn partial_update_leaves_other_fields_alone() {
        let change = UpdateReportStatusRequest {
            priority: Some(ReportPriority::Urgent),
            ..Default::default()
        }
        .into_change("a1", Utc::now());
        assert_eq!(change.status, None);
        assert_eq!(change.assigned_to, None);
        assert_eq!(change.resolved_at, None);
        assert_eq!(change.resolved_by, None);

        let closing = UpdateReportStatusRequest {
            status: Some(ReportStatus::Closed),
            ..Default::default()
        }
        .into_change("a1", Utc::now());
        assert_eq!(closing.resolved_at, None);
    }

    #[test]
    fn blank_response_message_is_rejected() {
        let blank = RespondRequest {
            message: Some("   ".into()),
        };
        assert!(blank.validated_message().is_err());
        assert!(RespondRequest { message: None }.validated_message().is_err());
        let ok = RespondRequest {
            message: Some(" Thanks ".into()),
        };
        assert_eq!(ok.validated_message().unwrap(), "Thanks");
    }

    #[test]
    fn status_path_segment_parses() {
        assert_eq!(
            "in_progress".parse::<ReportStatus>().unwrap(),
            ReportStatus::InProgress
        );
        assert!("open".parse::<ReportStatus>().is_err());
    }
}
