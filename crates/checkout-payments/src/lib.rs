//! # checkout-payments
//!
//! Chargily Pay checkout initiation, payment records and webhook receipt.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐  pending row  ┌─────────────────┐   redirect   ┌───────────────────┐
//! │  subscribe  │──────────────▶│ Chargily hosted │─────────────▶│ /chargilypay/back │
//! │    form     │   + checkout  │  checkout page  │              │  (reconcile)      │
//! └─────────────┘               └─────────────────┘              └───────────────────┘
//!                                        │
//!                                        │ signed POST
//!                                        ▼
//!                              ┌──────────────────────┐
//!                              │ /chargilypay/webhook │
//!                              │  (reconcile)         │
//!                              └──────────────────────┘
//! ```
//!
//! Both the return redirect and the webhook map the checkout status onto the
//! payment: `paid` → `paid`, `failed`/`canceled` → `failed`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use checkout_payments::{
//!     ChargilyClient, CheckoutForm, MemoryPaymentStore, PaymentStore, initiate,
//! };
//!
//! let client = ChargilyClient::from_env()?;
//! let store = MemoryPaymentStore::new();
//! let user = store.first_or_create_user("buyer@example.com", "Buyer")?;
//!
//! let form: CheckoutForm = serde_json::from_str(r#"{"amount": 25000, "currency": "dzd"}"#)?;
//! let validated = form.validate()?;
//! let initiated = initiate(&store, &client, &user, validated, "https://shop.example").await?;
//!
//! // Redirect user to: initiated.redirect_url()?
//! ```

mod checkout;
mod client;
mod error;
mod initiate;
mod payment;
mod reconcile;
mod sqlite;
mod webhook;

pub use checkout::{Checkout, CheckoutMetadata, CheckoutStatus, CreateCheckout, Locale};
pub use client::{ChargilyClient, CheckoutGateway, Credentials, Mode};
pub use error::{PaymentError, Result, ValidationErrors};
pub use initiate::{
    CheckoutForm, Initiated, RETURN_PATH, ValidatedCheckout, WEBHOOK_PATH, checkout_request,
    initiate,
};
pub use payment::{MemoryPaymentStore, NewPayment, Payment, PaymentStatus, PaymentStore, User};
pub use reconcile::{Reconciled, apply_checkout_status, target_status};
pub use sqlite::SqlitePaymentStore;
pub use webhook::{
    SIGNATURE_HEADER, WebhookEvent, WebhookHandler, WebhookOutcome, sign, verify_signature,
};
