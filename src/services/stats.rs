use chrono::{DateTime, Local, Utc};

use crate::db::Database;
use crate::error::AppResult;
use crate::models::{month_start, DashboardStats, RecentOrder, SalesBucket, SalesPeriod, VendorStatusCount};

const RECENT_ORDERS: i64 = 5;

/// Dashboard counters and sales time series
pub struct StatsService;

impl StatsService {
    async fn count(db: &Database, sql: &str) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as(sql).fetch_one(db.pool()).await?;
        Ok(count)
    }

    /// Dashboard figures with revenue counted from the start of the local month
    pub async fn dashboard_stats(db: &Database) -> AppResult<DashboardStats> {
        Self::dashboard_stats_since(db, month_start(Local::now())?).await
    }

    pub async fn dashboard_stats_since(
        db: &Database,
        revenue_since: DateTime<Utc>,
    ) -> AppResult<DashboardStats> {
        let total_users = Self::count(db, "SELECT COUNT(*) FROM users").await?;
        let total_vendors = Self::count(db, "SELECT COUNT(*) FROM vendors").await?;
        let total_products = Self::count(db, "SELECT COUNT(*) FROM admin_products").await?
            + Self::count(db, "SELECT COUNT(*) FROM vendor_products").await?;
        let total_orders = Self::count(db, "SELECT COUNT(*) FROM orders").await?;
        let pending_reports =
            Self::count(db, "SELECT COUNT(*) FROM reports WHERE status = 'pending'").await?;

        let recent_orders: Vec<RecentOrder> = sqlx::query_as(
            r#"
            SELECT id, customer_name, total_amount, status, created_at
            FROM orders ORDER BY created_at DESC LIMIT ?
            "#,
        )
        .bind(RECENT_ORDERS)
        .fetch_all(db.pool())
        .await?;

        let (monthly_revenue,): (Option<f64>,) = sqlx::query_as(
            r#"
            SELECT SUM(total_amount) FROM orders
            WHERE payment_status = 'completed' AND julianday(created_at) >= julianday(?)
            "#,
        )
        .bind(revenue_since)
        .fetch_one(db.pool())
        .await?;

        let vendor_stats: Vec<VendorStatusCount> = sqlx::query_as(
            "SELECT status, COUNT(*) AS count FROM vendors GROUP BY status ORDER BY status",
        )
        .fetch_all(db.pool())
        .await?;

        Ok(DashboardStats {
            total_users,
            total_vendors,
            total_products,
            total_orders,
            pending_reports,
            monthly_revenue: monthly_revenue.unwrap_or(0.0),
            recent_orders,
            vendor_stats,
        })
    }

    /// Completed or delivered orders in the period, bucketed by day or month
    pub async fn sales_data(
        db: &Database,
        period: SalesPeriod,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<SalesBucket>> {
        let since = period.window_start(now)?;

        let buckets = sqlx::query_as(
            r#"
            SELECT strftime(?, created_at) AS bucket_key,
                   SUM(total_amount) AS sales,
                   COUNT(*) AS orders
            FROM orders
            WHERE julianday(created_at) >= julianday(?)
              AND status IN ('completed', 'delivered')
            GROUP BY bucket_key
            ORDER BY bucket_key ASC
            "#,
        )
        .bind(period.bucket_format())
        .bind(since)
        .fetch_all(db.pool())
        .await?;

        Ok(buckets)
    }
}
