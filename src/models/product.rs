use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, AppResult};

/// Vendor id/name reported for admin-owned catalog entries
pub const ADMIN_STORE_ID: &str = "admin";
pub const ADMIN_STORE_NAME: &str = "Admin Store";
pub const UNKNOWN_VENDOR_NAME: &str = "Unknown Vendor";

/// Product visibility. Admin products only use `Active`/`Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Pending,
    Active,
    Inactive,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Pending => "pending",
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
        }
    }
}

impl From<String> for ProductStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => ProductStatus::Pending,
            "inactive" => ProductStatus::Inactive,
            _ => ProductStatus::Active,
        }
    }
}

/// Catalog entry owned by the store itself
#[derive(Debug, Clone, FromRow)]
pub struct AdminProduct {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub image_url: String,
    pub stock_quantity: i64,
    #[sqlx(try_from = "String")]
    pub status: ProductStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Catalog entry owned by a vendor; `vendor_name` comes from a join
#[derive(Debug, Clone, FromRow)]
pub struct VendorProduct {
    pub id: String,
    pub vendor_id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub image_url: String,
    pub stock_quantity: i64,
    #[sqlx(try_from = "String")]
    pub status: ProductStatus,
    pub size: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub vendor_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-facing product shape shared by both catalog variants
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub vendor_id: String,
    pub vendor_name: String,
    pub images: Vec<String>,
    pub status: ProductStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Map a stored image reference to the client `images` list
pub fn image_urls(image_ref: &str, uploads_base_url: &str) -> Vec<String> {
    let image_ref = image_ref.trim();
    if image_ref.is_empty() {
        return Vec::new();
    }
    if image_ref.starts_with("http://") || image_ref.starts_with("https://") {
        return vec![image_ref.to_string()];
    }
    vec![format!(
        "{}/{}",
        uploads_base_url.trim_end_matches('/'),
        image_ref.trim_start_matches('/')
    )]
}

impl AdminProduct {
    pub fn to_view(&self, uploads_base_url: &str) -> ProductView {
        ProductView {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            stock: self.stock_quantity,
            category: self.category.clone(),
            size: None,
            vendor_id: ADMIN_STORE_ID.to_string(),
            vendor_name: ADMIN_STORE_NAME.to_string(),
            images: image_urls(&self.image_url, uploads_base_url),
            status: self.status,
            approved_by: None,
            approved_at: None,
            created_by: Some(self.created_by.clone()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl VendorProduct {
    pub fn to_view(&self, uploads_base_url: &str) -> ProductView {
        let vendor_name = self
            .vendor_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_VENDOR_NAME.to_string());

        ProductView {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            stock: self.stock_quantity,
            category: self.category.clone(),
            size: self.size.clone(),
            vendor_id: self.vendor_id.clone(),
            vendor_name,
            images: image_urls(&self.image_url, uploads_base_url),
            status: self.status,
            approved_by: self.approved_by.clone(),
            approved_at: self.approved_at,
            created_by: None,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Product body accepted by create and update.
///
/// Stock arrives as either `stock` or `stock_quantity`; both land in the one
/// stored column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub stock_quantity: Option<i64>,
    pub category: Option<String>,
    #[serde(alias = "imageUrl")]
    pub image_url: Option<String>,
    pub status: Option<ProductStatus>,
    pub size: Option<String>,
    #[serde(alias = "vendorId")]
    pub vendor_id: Option<String>,
}

/// Validated fields for a new product
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock_quantity: i64,
    pub category: String,
    pub image_url: String,
    pub status: Option<ProductStatus>,
    pub size: Option<String>,
}

/// Validated partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock_quantity: Option<i64>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<ProductStatus>,
    pub size: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn check_price(price: f64) -> AppResult<f64> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::InvalidInput(
            "Price must be a valid positive number".to_string(),
        ));
    }
    Ok(price)
}

fn check_stock(stock: i64) -> AppResult<i64> {
    if stock < 0 {
        return Err(AppError::InvalidInput(
            "Stock must be a valid non-negative number".to_string(),
        ));
    }
    Ok(stock)
}

impl ProductInput {
    /// Canonical stock value; `stock` wins when both names are present
    pub fn stock_value(&self) -> Option<i64> {
        self.stock.or(self.stock_quantity)
    }

    pub fn validate_new(&self) -> AppResult<NewProduct> {
        let name = non_blank(&self.name);
        let description = non_blank(&self.description);
        let category = non_blank(&self.category);

        let mut missing = Vec::new();
        if name.is_none() {
            missing.push("name");
        }
        if description.is_none() {
            missing.push("description");
        }
        if self.price.is_none() {
            missing.push("price");
        }
        if category.is_none() {
            missing.push("category");
        }
        if !missing.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        Ok(NewProduct {
            name: name.unwrap_or_default(),
            description: description.unwrap_or_default(),
            price: check_price(self.price.unwrap_or_default())?,
            stock_quantity: check_stock(self.stock_value().unwrap_or(0))?,
            category: category.unwrap_or_default(),
            image_url: self
                .image_url
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            status: self.status,
            size: non_blank(&self.size),
        })
    }

    pub fn validate_changes(&self) -> AppResult<ProductChanges> {
        Ok(ProductChanges {
            name: non_blank(&self.name),
            description: non_blank(&self.description),
            price: self.price.map(check_price).transpose()?,
            stock_quantity: self.stock_value().map(check_stock).transpose()?,
            category: non_blank(&self.category),
            image_url: self.image_url.as_deref().map(|s| s.trim().to_string()),
            status: self.status,
            size: non_blank(&self.size),
        })
    }
}

/// Filters for product lists
#[derive(Debug, Clone, Deserialize)]
pub struct ProductListQuery {
    pub category: Option<String>,
    pub status: Option<ProductStatus>,
    pub search: Option<String>,
    #[serde(alias = "vendorId")]
    pub vendor_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:3007/uploads";

    #[test]
    fn image_reference_is_resolved_against_uploads() {
        assert!(image_urls("", BASE).is_empty());
        assert!(image_urls("   ", BASE).is_empty());
        assert_eq!(
            image_urls("images-1.png", BASE),
            vec!["http://localhost:3007/uploads/images-1.png"]
        );
        assert_eq!(
            image_urls("/images-1.png", "http://cdn.test/uploads/"),
            vec!["http://cdn.test/uploads/images-1.png"]
        );
        assert_eq!(
            image_urls("https://cdn.test/a.jpg", BASE),
            vec!["https://cdn.test/a.jpg"]
        );
    }

    #[test]
    fn stock_accepts_either_field_name() {
        let legacy: ProductInput = serde_json::from_str(r#"{"stock_quantity": 7}"#).unwrap();
        assert_eq!(legacy.stock_value(), Some(7));

        let current: ProductInput = serde_json::from_str(r#"{"stock": 3}"#).unwrap();
        assert_eq!(current.stock_value(), Some(3));

        let both: ProductInput =
            serde_json::from_str(r#"{"stock": 3, "stock_quantity": 9}"#).unwrap();
        assert_eq!(both.stock_value(), Some(3));
    }

    #[test]
    fn missing_fields_are_listed() {
        let input = ProductInput {
            name: Some("Mug".into()),
            category: Some("  ".into()),
            ..Default::default()
        };
        match input.validate_new() {
            Err(AppError::InvalidInput(msg)) => {
                assert_eq!(msg, "Missing required fields: description, price, category")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn new_product_defaults_stock_to_zero_and_trims() {
        let input = ProductInput {
            name: Some(" Mug ".into()),
            description: Some("Ceramic".into()),
            price: Some(12.5),
            category: Some("kitchen".into()),
            ..Default::default()
        };
        let product = input.validate_new().unwrap();
        assert_eq!(product.name, "Mug");
        assert_eq!(product.stock_quantity, 0);
        assert_eq!(product.image_url, "");
    }

    #[test]
    fn negative_values_are_rejected() {
        let negative_price = ProductInput {
            price: Some(-1.0),
            ..Default::default()
        };
        assert!(negative_price.validate_changes().is_err());

        let negative_stock = ProductInput {
            stock_quantity: Some(-4),
            ..Default::default()
        };
        assert!(negative_stock.validate_changes().is_err());
    }

    #[test]
    fn changes_skip_blank_fields() {
        let input = ProductInput {
            name: Some("".into()),
            stock: Some(0),
            ..Default::default()
        };
        let changes = input.validate_changes().unwrap();
        assert_eq!(changes.name, None);
        assert_eq!(changes.stock_quantity, Some(0));
    }

    #[test]
    fn vendor_view_falls_back_to_unknown_vendor() {
        let product = VendorProduct {
            id: "p1".into(),
            vendor_id: "v1".into(),
            name: "Lamp".into(),
            description: "Desk lamp".into(),
            price: 30.0,
            category: "home".into(),
            image_url: String::new(),
            stock_quantity: 4,
            status: ProductStatus::Pending,
            size: None,
            approved_by: None,
            approved_at: None,
            vendor_name: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let view = product.to_view(BASE);
        assert_eq!(view.vendor_name, UNKNOWN_VENDOR_NAME);
        assert_eq!(view.stock, 4);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["stock"], 4);
        assert!(json.get("stock_quantity").is_none());
        assert!(json.get("size").is_none());
    }
}
