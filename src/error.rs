use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDeactivated,

    // Lookup errors
    #[error("User not found")]
    UserNotFound,

    #[error("Vendor not found")]
    VendorNotFound,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Report not found")]
    ReportNotFound,

    // Conflicting input
    #[error("User with this email already exists")]
    UserAlreadyExists,

    #[error("Vendor with this email already exists")]
    VendorAlreadyExists,

    // Order errors
    #[error("Only cancelled orders can be deleted")]
    OrderNotCancelled,

    // Invalid input
    #[error("{0}")]
    InvalidInput(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::UserAlreadyExists
            | AppError::VendorAlreadyExists
            | AppError::OrderNotCancelled
            | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::InvalidCredentials | AppError::AccountDeactivated => {
                StatusCode::UNAUTHORIZED
            }

            // 404 Not Found
            AppError::UserNotFound
            | AppError::VendorNotFound
            | AppError::ProductNotFound
            | AppError::OrderNotFound
            | AppError::ReportNotFound => StatusCode::NOT_FOUND,

            // 500 Internal Server Error
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {}", self);
            "Server error".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "success": false,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(e: argon2::password_hash::Error) -> Self {
        AppError::Internal(format!("Password hashing failed: {}", e))
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
