use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Vendor onboarding status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorStatus {
    Pending,
    Approved,
    Blocked,
    Suspended,
}

impl VendorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorStatus::Pending => "pending",
            VendorStatus::Approved => "approved",
            VendorStatus::Blocked => "blocked",
            VendorStatus::Suspended => "suspended",
        }
    }
}

impl From<String> for VendorStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "approved" => VendorStatus::Approved,
            "blocked" => VendorStatus::Blocked,
            "suspended" => VendorStatus::Suspended,
            _ => VendorStatus::Pending,
        }
    }
}

/// Uploaded vendor document reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorDocument {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub url: String,
    #[serde(default = "Utc::now")]
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    pub bank_name: Option<String>,
    pub routing_number: Option<String>,
}

/// Aggregate customer rating
#[derive(Debug, Clone, Copy, Serialize, FromRow)]
pub struct VendorRating {
    #[sqlx(rename = "rating_average")]
    pub average: f64,
    #[sqlx(rename = "rating_count")]
    pub count: i64,
}

/// Vendor model
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub tax_id: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: VendorStatus,
    pub documents: Json<Vec<VendorDocument>>,
    pub bank_details: Option<Json<BankDetails>>,
    #[sqlx(flatten)]
    pub rating: VendorRating,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vendor {
    /// Storefront label: business name when set, else contact name
    pub fn display_name(&self) -> &str {
        self.business_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.name)
    }
}

/// Create vendor request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVendorRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub tax_id: Option<String>,
    pub status: Option<VendorStatus>,
    #[serde(default)]
    pub documents: Vec<VendorDocument>,
    pub bank_details: Option<BankDetails>,
}

/// Partial vendor update; omitted fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVendorRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub tax_id: Option<String>,
    pub status: Option<VendorStatus>,
    pub documents: Option<Vec<VendorDocument>>,
    pub bank_details: Option<BankDetails>,
}

/// Filters for the vendor list
#[derive(Debug, Clone, Deserialize)]
pub struct VendorListQuery {
    pub status: Option<VendorStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
