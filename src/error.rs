use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Failure of a request handler. Every route group returns [`AppResult`].
#[derive(Debug, Error)]
pub enum AppError {
    /// Unexpected failure; the client only sees an error id.
    #[error("Internal error: {0}")]
    Internal(#[source] anyhow::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    /// The database could not be reached or the pool is exhausted.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    /// A statement failed; the message is logged, never returned.
    #[error("Database error: {0}")]
    Database(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Rate limited. Retry after {retry_after_seconds} seconds")]
    RateLimited { retry_after_seconds: u64 },
    #[error("Validation error on field '{field}': {message}")]
    ValidationError { field: String, message: String },
    #[error("I/O error: {0}")]
    IoError(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

/// Wire shape of every error response.
#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
    status: u16,
    timestamp: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Internal(_) | AppError::Database(_) | AppError::IoError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
        }
    }

    fn body(self) -> ErrorBody {
        let (code, message, details) = match self {
            AppError::Internal(e) => {
                let error_id = uuid::Uuid::new_v4();
                tracing::error!(%error_id, "Internal error: {:?}", e);
                let details = json!({ "error_id": error_id.to_string() });
                ("INTERNAL_ERROR", "An internal server error occurred".to_string(), Some(details))
            }
            AppError::NotFound(msg) => ("NOT_FOUND", msg, None),
            AppError::ServiceUnavailable(msg) => ("SERVICE_UNAVAILABLE", msg, None),
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                ("DATABASE_ERROR", "A database error occurred".to_string(), None)
            }
            AppError::Unauthorized(msg) => ("UNAUTHORIZED", msg, None),
            AppError::RateLimited { retry_after_seconds } => (
                "RATE_LIMITED",
                format!("Too many requests. Please retry after {} seconds", retry_after_seconds),
                Some(json!({ "retry_after_seconds": retry_after_seconds })),
            ),
            AppError::ValidationError { field, message } => (
                "VALIDATION_ERROR",
                format!("Validation failed for field '{}'", field),
                Some(json!({ "field": field, "message": message })),
            ),
            AppError::IoError(msg) => {
                tracing::error!("I/O error: {}", msg);
                ("IO_ERROR", "An I/O error occurred".to_string(), None)
            }
        };
        ErrorBody { code, message, details }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let envelope = ErrorEnvelope {
            error: self.body(),
            status: status.as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        (status, Json(envelope)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => AppError::Database(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => {
                AppError::ServiceUnavailable("Database connection pool timed out".to_string())
            }
            sqlx::Error::Io(e) => AppError::ServiceUnavailable(format!("Database unreachable: {}", e)),
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(format!("{}: {}", err.kind(), err))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(anyhow::anyhow!("background task failed: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Converts an `Option` into a `NotFound` error naming the missing entity.
pub trait OptionExt<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(format!("{} not found", entity)))
    }
}

/// Request validation helpers shared by the route groups.
pub mod validation {
    use super::{AppError, AppResult};

    pub const MAX_TRACKING_LEN: usize = 64;

    fn invalid(message: String) -> AppError {
        AppError::ValidationError { field: "tracking".to_string(), message }
    }

    /// Upper-cases a tracking number after checking its shape: non-empty, at
    /// most 64 characters, ASCII alphanumerics and `-` only.
    pub fn normalize_tracking_number(raw: &str) -> AppResult<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid("Tracking number cannot be empty".to_string()));
        }
        if trimmed.len() > MAX_TRACKING_LEN {
            return Err(invalid(format!("Tracking number exceeds {} characters", MAX_TRACKING_LEN)));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(invalid("Tracking number may only contain letters, digits and '-'".to_string()));
        }
        Ok(trimmed.to_ascii_uppercase())
    }
}
