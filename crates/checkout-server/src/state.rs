//! Application State

use std::sync::Arc;

use axum::http::HeaderMap;
use checkout_payments::{CheckoutGateway, PaymentStore};

use crate::config::Config;
use crate::error::AppError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment and user records
    pub store: Arc<dyn PaymentStore>,

    /// Chargily client (optional - None if not configured)
    pub gateway: Option<Arc<dyn CheckoutGateway>>,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn gateway(&self) -> Result<&Arc<dyn CheckoutGateway>, AppError> {
        self.gateway.as_ref().ok_or(AppError::PaymentsDisabled)
    }

    /// Configured public origin, else the scheme and host the request came in on
    pub fn public_base_url(&self, headers: &HeaderMap) -> String {
        if let Some(url) = &self.config.public_base_url {
            return url.clone();
        }

        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        let scheme = header("x-forwarded-proto").unwrap_or("http");
        let host = header("x-forwarded-host")
            .or_else(|| header("host"))
            .unwrap_or("localhost");

        format!("{scheme}://{host}").trim_end_matches('/').to_string()
    }
}
