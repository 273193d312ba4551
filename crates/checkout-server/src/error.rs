//! HTTP Error Mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use checkout_payments::PaymentError;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by route handlers
#[derive(Debug, Error)]
pub enum AppError {
    /// Chargily credentials were not provided at startup
    #[error("Payments not configured")]
    PaymentsDisabled,

    /// Could not send the customer to the hosted checkout
    #[error("Redirection failed: {0}")]
    RedirectFailed(PaymentError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::PaymentsDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({"message": "Payments not configured", "code": "PAYMENTS_DISABLED"}),
            ),
            AppError::Payment(PaymentError::Validation(errors)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "message": errors.first().unwrap_or("The given data was invalid."),
                    "errors": errors,
                }),
            ),
            AppError::RedirectFailed(e) => {
                tracing::error!("Checkout redirect error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "message": "Redirection failed",
                        "errors": {"payment": ["Redirection failed"]},
                    }),
                )
            }
            AppError::Payment(e @ PaymentError::Config(_)) => {
                tracing::error!("Configuration error: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({"message": e.user_message(), "code": "CONFIG_ERROR"}),
                )
            }
            AppError::Payment(e) => {
                tracing::error!("Payment error: {}", e);
                let status = if e.is_retryable() {
                    StatusCode::BAD_GATEWAY
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, json!({"message": e.user_message(), "code": "PAYMENT_ERROR"}))
            }
        };

        (status, Json(body)).into_response()
    }
}
