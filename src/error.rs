use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

/// Application errors
///
/// Per-recipient resolution and delivery failures are never raised as errors;
/// they are recorded as data on the batch's `DeliveryResult`s.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Provider configuration error: {0}")]
    ProviderConfiguration(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Error type name exposed in JSON bodies
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NotFound",
            AppError::Validation(_) => "ValidationError",
            AppError::Conflict(_) => "ConflictError",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::ProviderConfiguration(_) => "ProviderConfigurationError",
            AppError::Database(_) => "DatabaseError",
            AppError::Internal(_) => "InternalError",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ProviderConfiguration(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Driver errors can leak schema details, keep them in the logs only
        let message = match self {
            AppError::Database(e) => {
                log::error!("Database error: {}", e);
                "Database error".to_string()
            }
            _ => self.to_string(),
        };

        let response = ErrorResponse {
            error: ErrorDetail {
                error_type: self.error_type().to_string(),
                message,
            },
        };

        HttpResponse::build(self.status_code()).json(response)
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
