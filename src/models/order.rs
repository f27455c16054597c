use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::error::{AppError, AppResult};

/// Fulfilment status. Any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Returned => "returned",
        }
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "processing" => OrderStatus::Processing,
            "shipped" => OrderStatus::Shipped,
            "delivered" => OrderStatus::Delivered,
            "cancelled" => OrderStatus::Cancelled,
            "returned" => OrderStatus::Returned,
            _ => OrderStatus::Pending,
        }
    }
}

/// Payment status, independent of fulfilment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "completed" => PaymentStatus::Completed,
            "failed" => PaymentStatus::Failed,
            "refunded" => PaymentStatus::Refunded,
            _ => PaymentStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    DebitCard,
    Paypal,
    BankTransfer,
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
        }
    }
}

impl From<String> for PaymentMethod {
    fn from(s: String) -> Self {
        match s.as_str() {
            "debit_card" => PaymentMethod::DebitCard,
            "paypal" => PaymentMethod::Paypal,
            "bank_transfer" => PaymentMethod::BankTransfer,
            "cash_on_delivery" => PaymentMethod::CashOnDelivery,
            _ => PaymentMethod::CreditCard,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub full_address: Option<String>,
}

/// Order line item with its captured unit price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub price: f64,
    pub vendor_id: String,
}

impl OrderItem {
    pub fn subtotal(&self) -> f64 {
        self.price * self.quantity as f64
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.product_id.trim().is_empty() || self.product_name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Each item needs a productId and productName".to_string(),
            ));
        }
        if self.vendor_id.trim().is_empty() {
            return Err(AppError::InvalidInput("Each item needs a vendorId".to_string()));
        }
        if self.quantity < 1 {
            return Err(AppError::InvalidInput(
                "Item quantity must be at least 1".to_string(),
            ));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AppError::InvalidInput(
                "Item price must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Total for a new item list.
///
/// An empty list keeps `current` rather than resetting it to zero.
pub fn recompute_total(items: &[OrderItem], current: f64) -> f64 {
    if items.is_empty() {
        return current;
    }
    items.iter().map(OrderItem::subtotal).sum()
}

/// Order model
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    #[sqlx(try_from = "String")]
    pub payment_method: PaymentMethod,
    pub payment_id: Option<String>,
    pub shipping_address: Option<Json<ShippingAddress>>,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Replace line items, keeping `total_amount` in step
    pub fn set_items(&mut self, items: Vec<OrderItem>) {
        self.total_amount = recompute_total(&items, self.total_amount);
        self.items = items;
    }

    /// Only cancelled orders may be deleted
    pub fn can_delete(&self) -> bool {
        self.status == OrderStatus::Cancelled
    }
}

/// `PUT /orders/:id/status` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    #[serde(default, deserialize_with = "super::flexible_datetime::deserialize")]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Column values written by a status update; `None` keeps the stored value
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatusChange {
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl UpdateOrderStatusRequest {
    /// Resolve side effects: only `delivered` stamps `delivered_at`
    pub fn into_change(self, now: DateTime<Utc>) -> OrderStatusChange {
        let delivered_at = (self.status == OrderStatus::Delivered).then_some(now);
        OrderStatusChange {
            status: self.status,
            tracking_number: self
                .tracking_number
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            estimated_delivery: self.estimated_delivery,
            delivered_at,
        }
    }
}

/// `PUT /orders/:id/payment-status` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
}

/// Create order request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    pub payment_method: Option<PaymentMethod>,
    pub shipping_address: Option<ShippingAddress>,
    pub notes: Option<String>,
}

/// Replace the item list of an existing order
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceItemsRequest {
    pub items: Vec<OrderItem>,
}

/// Filters for order lists
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
