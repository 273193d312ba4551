//! HTTP Handlers

use axum::{
    Json,
    extract::{FromRequest, Query, Request, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use checkout_payments::{
    CheckoutForm, PaymentError, SIGNATURE_HEADER, WebhookHandler, WebhookOutcome,
    apply_checkout_status, initiate,
};

use crate::error::AppError;
use crate::page::{Page, PageRequest, location};
use crate::state::AppState;

/// Name given to the fallback paying user
pub const FALLBACK_USER_NAME: &str = "Chargily Test User";

/// Amount prefilled on the subscribe page
pub const DEFAULT_AMOUNT: u64 = 25_000;
pub const DEFAULT_CURRENCY: &str = "dzd";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub processor_configured: bool,
    pub store: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct BackQuery {
    #[serde(default)]
    pub checkout_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: bool,
    pub message: &'static str,
}

impl WebhookResponse {
    fn reply(code: StatusCode, status: bool, message: &'static str) -> Response {
        (code, Json(Self { status, message })).into_response()
    }
}

/// Subscribe form, accepted as JSON or urlencoded
pub struct CheckoutInput(pub CheckoutForm);

impl<S> FromRequest<S> for CheckoutInput
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let axum::Form(form) = axum::Form::<CheckoutForm>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(form))
        } else {
            let Json(form) = Json::<CheckoutForm>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(form))
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        processor_configured: state.gateway.is_some(),
        store: state.store.backend(),
    })
}

/// Public page to kick off a test checkout
pub async fn subscribe_page(State(state): State<AppState>, page: PageRequest) -> Response {
    Page::new(
        "chargilypay/subscribe",
        json!({"amount": DEFAULT_AMOUNT, "currency": DEFAULT_CURRENCY}),
        &page,
        &state.config.asset_version,
    )
    .render(&page)
}

/// Record a pending payment and send the customer to the Chargily checkout page
pub async fn redirect(
    State(state): State<AppState>,
    page: PageRequest,
    headers: HeaderMap,
    CheckoutInput(form): CheckoutInput,
) -> Result<Response, AppError> {
    let gateway = state.gateway()?;
    let validated = form.validate()?;
    let base_url = state.public_base_url(&headers);

    let user = state
        .store
        .first_or_create_user(&state.config.fallback_email, FALLBACK_USER_NAME)
        .map_err(AppError::RedirectFailed)?;

    let initiated = initiate(state.store.as_ref(), gateway.as_ref(), &user, validated, &base_url)
        .await
        .map_err(AppError::RedirectFailed)?;

    let url = initiated.redirect_url().map_err(AppError::RedirectFailed)?;
    Ok(location(&page, url))
}

/// Where Chargily sends the customer after the payment completes, fails or is canceled
pub async fn back(
    State(state): State<AppState>,
    page: PageRequest,
    Query(query): Query<BackQuery>,
) -> Result<Response, AppError> {
    let gateway = state.gateway()?;

    let checkout_id = query.checkout_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    let checkout = match checkout_id {
        Some(id) => match gateway.get_checkout(id).await {
            Ok(checkout) => checkout,
            Err(e) => {
                tracing::warn!(checkout_id = %id, "Could not fetch checkout: {}", e);
                None
            }
        },
        None => None,
    };

    let mut payment = None;
    if let Some(checkout) = &checkout {
        if let Some(payment_id) = checkout.payment_id() {
            if let Some(found) = state.store.find_payment(payment_id)? {
                let reconciled = apply_checkout_status(state.store.as_ref(), found, checkout)?;
                payment = Some(reconciled.into_payment());
            }
        }
    }

    Ok(Page::new(
        "chargilypay/result",
        json!({"checkout": checkout, "payment": payment}),
        &page,
        &state.config.asset_version,
    )
    .render(&page))
}

/// Chargily webhook; processed without the customer present
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let invalid =
        || WebhookResponse::reply(StatusCode::FORBIDDEN, false, "Invalid Webhook request");

    let Ok(gateway) = state.gateway() else {
        return AppError::PaymentsDisabled.into_response();
    };

    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        tracing::warn!("Webhook without signature header");
        return invalid();
    };

    let handler = WebhookHandler::new(state.store.clone());

    let event = match handler.verify(&body, signature, gateway.webhook_secret()) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Webhook rejected: {}", e);
            return invalid();
        }
    };

    match handler.handle(&event) {
        Ok(WebhookOutcome::Completed(payment)) => {
            tracing::info!(payment_id = payment.id, "Payment completed");
            WebhookResponse::reply(StatusCode::OK, true, "Payment has been completed")
        }
        Ok(WebhookOutcome::Canceled(payment)) => {
            tracing::info!(payment_id = payment.id, "Payment canceled");
            WebhookResponse::reply(StatusCode::OK, true, "Payment has been canceled")
        }
        Ok(WebhookOutcome::Ignored { reason }) => {
            tracing::debug!(event_id = %event.id, reason, "Webhook ignored");
            invalid()
        }
        Err(PaymentError::MissingMetadata) => {
            WebhookResponse::reply(StatusCode::BAD_REQUEST, false, "Missing payment metadata")
        }
        Err(e) => {
            tracing::error!("Webhook processing error: {}", e);
            invalid()
        }
    }
}
