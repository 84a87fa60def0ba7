//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::domain::{
    allocation::AllocationError, amortization::ScheduleError, petty_cash::PettyCashError,
};

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error code.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Session token is missing, unknown or expired.
    #[error("Invalid or expired session")]
    Unauthorized,

    /// Authenticated user lacks the role required for the operation.
    #[error("You do not have permission to perform this action")]
    Forbidden,

    /// Entity does not exist or belongs to another organization.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unique or referential constraint would be violated.
    #[error("{0}")]
    Conflict(String),

    /// Request body or parameters are invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Entity is not in a state that allows the requested change.
    #[error("{0}")]
    InvalidStateTransition(String),

    /// Petty cash or account balance does not cover the amount.
    #[error("{0}")]
    InsufficientFunds(String),

    /// Optional integration (MercadoPago, S3) is not configured.
    #[error("{0} integration is not configured")]
    IntegrationDisabled(&'static str),

    /// MercadoPago returned an error or an unexpected body.
    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),

    /// Object storage failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Report could not be rendered.
    #[error("Report error: {0}")]
    Report(String),

    /// Webhook signature did not match.
    #[error("Invalid webhook signature")]
    InvalidSignature,
}

impl AppError {
    /// Map a database error into a friendlier variant.
    ///
    /// Unique violations (23505) become `Conflict` with `duplicate`, and
    /// foreign-key violations (23503) become `Conflict` with `in_use`.
    /// Everything else stays a `Database` error.
    pub fn from_db(err: sqlx::Error, duplicate: &str, in_use: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return AppError::Conflict(duplicate.to_string());
            }
            if db_err.is_foreign_key_violation() {
                return AppError::Conflict(in_use.to_string());
            }
        }
        AppError::Database(err)
    }

    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::InvalidSignature => (StatusCode::UNAUTHORIZED, "invalid_signature"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::InvalidStateTransition(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_state_transition")
            }
            AppError::InsufficientFunds(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_funds")
            }
            AppError::IntegrationDisabled(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "integration_disabled")
            }
            AppError::PaymentGateway(_) => (StatusCode::BAD_GATEWAY, "payment_gateway_error"),
            AppError::Storage(_) => (StatusCode::BAD_GATEWAY, "storage_error"),
            AppError::Report(_) => (StatusCode::INTERNAL_SERVER_ERROR, "report_error"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        AppError::InvalidRequest(err.to_string())
    }
}

impl From<AllocationError> for AppError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::NothingOwed | AllocationError::AlreadyPaid(_) => {
                AppError::InvalidStateTransition(err.to_string())
            }
            AllocationError::ExceedsOutstanding { .. } => {
                AppError::InsufficientFunds(err.to_string())
            }
            AllocationError::NonPositiveAmount | AllocationError::UnknownInstallment(_) => {
                AppError::InvalidRequest(err.to_string())
            }
        }
    }
}

impl From<PettyCashError> for AppError {
    fn from(err: PettyCashError) -> Self {
        match err {
            PettyCashError::NonPositiveAmount => AppError::InvalidRequest(err.to_string()),
            PettyCashError::DepositExhausted { .. } | PettyCashError::WithdrawalExhausted { .. } => {
                AppError::InsufficientFunds(err.to_string())
            }
            PettyCashError::DepositClosed | PettyCashError::PendingWithdrawals => {
                AppError::InvalidStateTransition(err.to_string())
            }
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Database errors are logged and hidden from the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();

        let message = match &self {
            AppError::InvalidRequest(msg) => msg.clone(),
            AppError::Database(err) => {
                tracing::error!(error = ?err, "database error");
                "An internal error occurred".to_string()
            }
            other => {
                if status.is_server_error() {
                    tracing::error!(error = %other, "request failed");
                }
                other.to_string()
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_shape() {
        let (status, body) = body_json(AppError::NotFound("Motorcycle")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
        assert_eq!(body["error"]["message"], "Motorcycle not found");
    }

    #[tokio::test]
    async fn test_invalid_request_uses_detail_message() {
        let (status, body) =
            body_json(AppError::InvalidRequest("year must be >= 1900".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "year must be >= 1900");
    }

    #[tokio::test]
    async fn test_database_error_is_hidden() {
        let (status, body) = body_json(AppError::Database(sqlx::Error::RowNotFound)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "An internal error occurred");
    }

    #[test]
    fn test_from_db_passes_through_non_constraint_errors() {
        let err = AppError::from_db(sqlx::Error::RowNotFound, "dup", "in use");
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn test_domain_errors_map_to_statuses() {
        let err: AppError = AllocationError::ExceedsOutstanding {
            requested: 10,
            outstanding: 5,
        }
        .into();
        assert_eq!(err.parts().1, "insufficient_funds");

        let err: AppError = PettyCashError::DepositClosed.into();
        assert_eq!(err.parts().1, "invalid_state_transition");

        let err: AppError = ScheduleError::InstallmentCount.into();
        assert_eq!(err.parts().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::Unauthorized.parts().0, StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.parts().0, StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Conflict("x".into()).parts().0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::IntegrationDisabled("MercadoPago").parts().0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::InsufficientFunds("x".into()).parts().0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
