//! chargily-checkout HTTP Server
//!
//! Axum server for the Chargily Pay checkout flow: the subscribe and result
//! pages, the redirect to the hosted checkout, and the webhook endpoint.

mod config;
mod error;
mod handlers;
mod page;
mod routes;
mod state;

use std::sync::Arc;

use checkout_payments::{
    ChargilyClient, CheckoutGateway, MemoryPaymentStore, PaymentStore, SqlitePaymentStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    // Payment store
    let store: Arc<dyn PaymentStore> = match config.database_url.as_deref() {
        Some(url) => Arc::new(SqlitePaymentStore::open(url)?),
        None => {
            tracing::warn!("⚠ DATABASE_URL not set - payments are kept in memory");
            Arc::new(MemoryPaymentStore::new())
        }
    };

    // Chargily client
    let gateway: Option<Arc<dyn CheckoutGateway>> = match ChargilyClient::from_env() {
        Ok(client) => {
            tracing::info!(mode = ?client.mode(), "✓ Chargily Pay configured");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!("⚠ Chargily Pay not configured - payments disabled ({})", e);
            tracing::warn!("  Set CHARGILY_PUBLIC_KEY and CHARGILY_SECRET_KEY in .env");
            None
        }
    };

    match &config.public_base_url {
        Some(url) => tracing::info!("Public base URL: {}", url),
        None => tracing::info!("Public base URL not set - using request host for callback URLs"),
    }

    let addr = config.bind_addr.clone();
    let state = AppState {
        store,
        gateway,
        config: Arc::new(config),
    };

    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 chargily-checkout running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                - Health check");
    tracing::info!("  GET  /chargilypay/subscribe - Start a test checkout");
    tracing::info!("  POST /chargilypay/redirect  - Redirect to Chargily");
    tracing::info!("  GET  /chargilypay/back      - Checkout result");
    tracing::info!("  POST /chargilypay/webhook   - Chargily webhook");

    axum::serve(listener, app).await?;

    Ok(())
}
