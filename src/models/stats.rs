use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::OrderStatus;
use crate::error::{AppError, AppResult};

/// `GET /admin/dashboard-stats` payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_vendors: i64,
    pub total_products: i64,
    pub total_orders: i64,
    pub pending_reports: i64,
    pub monthly_revenue: f64,
    pub recent_orders: Vec<RecentOrder>,
    pub vendor_stats: Vec<VendorStatusCount>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: String,
    pub customer_name: String,
    pub total_amount: f64,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VendorStatusCount {
    pub status: String,
    pub count: i64,
}

/// Sales lookback window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SalesPeriod {
    #[default]
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "1y")]
    Year,
}

impl SalesPeriod {
    /// Start of the window ending at `now`
    pub fn window_start(&self, now: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        let start = match self {
            SalesPeriod::Week => now.checked_sub_signed(Duration::days(7)),
            SalesPeriod::Month => now.checked_sub_signed(Duration::days(30)),
            SalesPeriod::Year => now.checked_sub_months(Months::new(12)),
        };
        start.ok_or_else(|| AppError::Internal("sales window out of range".to_string()))
    }

    /// strftime pattern of the bucket key: daily for 7d, monthly otherwise
    pub fn bucket_format(&self) -> &'static str {
        match self {
            SalesPeriod::Week => "%Y-%m-%d",
            SalesPeriod::Month | SalesPeriod::Year => "%Y-%m",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SalesDataQuery {
    #[serde(default)]
    pub period: SalesPeriod,
}

/// One point of the sales time series
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SalesBucket {
    pub bucket_key: String,
    pub sales: f64,
    pub orders: i64,
}

/// First instant of the month containing `now`, at local midnight of `tz`
pub fn month_start<Tz: TimeZone>(now: DateTime<Tz>) -> AppResult<DateTime<Utc>> {
    let first = now
        .date_naive()
        .with_day(1)
        .ok_or_else(|| AppError::Internal("invalid month start".to_string()))?;
    now.timezone()
        .from_local_datetime(&first.and_time(NaiveTime::MIN))
        .earliest()
        .map(|start| start.with_timezone(&Utc))
        .ok_or_else(|| AppError::Internal("month start does not exist locally".to_string()))
}
