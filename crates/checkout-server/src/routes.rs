//! Router

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::handlers::{back, health_check, redirect, subscribe_page, webhook};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(|| async { Redirect::to("/chargilypay/subscribe") }))
        .route("/health", get(health_check))
        // Checkout flow
        .route("/chargilypay/subscribe", get(subscribe_page))
        .route("/chargilypay/redirect", post(redirect))
        .route("/chargilypay/back", get(back))
        .route("/chargilypay/webhook", post(webhook))
        // Built frontend (/pkg/*)
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
