use chrono::Utc;
use sqlx::types::Json;
use sqlx::{Sqlite, Transaction};

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{
    recompute_total, CreateOrderRequest, Order, OrderItem, OrderStatusChange,
    UpdatePaymentStatusRequest, User,
};

/// Order lifecycle: creation, line items, status and payment status, deletion
pub struct OrderService;

impl OrderService {
    /// Load an order with its line items
    pub async fn get(db: &Database, order_id: &str) -> AppResult<Order> {
        let mut order: Order = sqlx::query_as("SELECT * FROM orders WHERE id = ?")
            .bind(order_id)
            .fetch_optional(db.pool())
            .await?
            .ok_or(AppError::OrderNotFound)?;

        order.items = Self::items(db, order_id).await?;
        Ok(order)
    }

    pub async fn items(db: &Database, order_id: &str) -> AppResult<Vec<OrderItem>> {
        let items = sqlx::query_as(
            r#"
            SELECT product_id, product_name, quantity, price, vendor_id
            FROM order_items WHERE order_id = ? ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(db.pool())
        .await?;
        Ok(items)
    }

    /// Attach line items to a page of orders
    pub async fn with_items(db: &Database, mut orders: Vec<Order>) -> AppResult<Vec<Order>> {
        for order in orders.iter_mut() {
            order.items = Self::items(db, &order.id).await?;
        }
        Ok(orders)
    }

    /// Create an order, snapshotting the customer's name and email
    pub async fn create(db: &Database, req: CreateOrderRequest) -> AppResult<Order> {
        if req.items.is_empty() {
            return Err(AppError::InvalidInput(
                "Order must contain at least one item".to_string(),
            ));
        }
        for item in &req.items {
            item.validate()?;
        }

        let customer: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(&req.customer_id)
            .fetch_optional(db.pool())
            .await?
            .ok_or(AppError::UserNotFound)?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let total = recompute_total(&req.items, 0.0);
        let payment_method = req.payment_method.unwrap_or_default();

        let mut tx = db.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, customer_name, customer_email, total_amount,
                                status, payment_status, payment_method, shipping_address, notes,
                                created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 'pending', 'pending', ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(total)
        .bind(payment_method.as_str())
        .bind(req.shipping_address.map(Json))
        .bind(&req.notes)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        Self::insert_items(&mut tx, &id, &req.items).await?;
        tx.commit().await?;

        tracing::info!(order_id = %id, total, "Order created");
        Self::get(db, &id).await
    }

    async fn insert_items(
        tx: &mut Transaction<'_, Sqlite>,
        order_id: &str,
        items: &[OrderItem],
    ) -> AppResult<()> {
        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, position, product_id, product_name, quantity, price, vendor_id)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(order_id)
            .bind(position as i64)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.price)
            .bind(&item.vendor_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Replace the line items and recompute the total.
    /// An empty list clears the items but keeps the previous total.
    pub async fn replace_items(
        db: &Database,
        order_id: &str,
        items: Vec<OrderItem>,
    ) -> AppResult<Order> {
        for item in &items {
            item.validate()?;
        }

        let mut order = Self::get(db, order_id).await?;
        order.set_items(items);

        let mut tx = db.pool().begin().await?;

        sqlx::query("DELETE FROM order_items WHERE order_id = ?")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        Self::insert_items(&mut tx, order_id, &order.items).await?;

        sqlx::query("UPDATE orders SET total_amount = ?, updated_at = ? WHERE id = ?")
            .bind(order.total_amount)
            .bind(Utc::now())
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(order_id, total = order.total_amount, "Order items replaced");
        Self::get(db, order_id).await
    }

    /// Apply a status change; any status may follow any other
    pub async fn update_status(
        db: &Database,
        order_id: &str,
        change: OrderStatusChange,
    ) -> AppResult<Order> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?,
                tracking_number = COALESCE(?, tracking_number),
                estimated_delivery = COALESCE(?, estimated_delivery),
                delivered_at = COALESCE(?, delivered_at),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(change.status.as_str())
        .bind(&change.tracking_number)
        .bind(change.estimated_delivery)
        .bind(change.delivered_at)
        .bind(Utc::now())
        .bind(order_id)
        .execute(db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::OrderNotFound);
        }

        tracing::info!(order_id, status = change.status.as_str(), "Order status updated");
        Self::get(db, order_id).await
    }

    pub async fn update_payment_status(
        db: &Database,
        order_id: &str,
        req: UpdatePaymentStatusRequest,
    ) -> AppResult<Order> {
        let payment_id = req
            .payment_id
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                payment_status = ?,
                payment_id = COALESCE(?, payment_id),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(req.payment_status.as_str())
        .bind(payment_id)
        .bind(Utc::now())
        .bind(order_id)
        .execute(db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::OrderNotFound);
        }

        tracing::info!(
            order_id,
            payment_status = req.payment_status.as_str(),
            "Order payment status updated"
        );
        Self::get(db, order_id).await
    }

    /// Delete an order; only cancelled orders qualify
    pub async fn delete(db: &Database, order_id: &str) -> AppResult<()> {
        let order = Self::get(db, order_id).await?;
        if !order.can_delete() {
            return Err(AppError::OrderNotCancelled);
        }

        // Guard again in SQL in case the status changed since the read
        let result = sqlx::query("DELETE FROM orders WHERE id = ? AND status = 'cancelled'")
            .bind(order_id)
            .execute(db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::OrderNotCancelled);
        }

        tracing::info!(order_id, "Order deleted");
        Ok(())
    }
}
