//! Chargily Pay Webhook Handling
//!
//! Verifies the `signature` header and settles the linked payment.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use std::sync::Arc;

use crate::checkout::Checkout;
use crate::error::{PaymentError, Result};
use crate::payment::{Payment, PaymentStore};
use crate::reconcile::{Reconciled, apply_checkout_status};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC-SHA256 of the raw body
pub const SIGNATURE_HEADER: &str = "signature";

/// Event envelope posted by Chargily
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: String,

    #[serde(default)]
    pub entity: Option<String>,

    /// Sent as `"true"`/`"false"`
    #[serde(default)]
    pub livemode: Value,

    /// e.g. `checkout.paid`
    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub data: Value,

    #[serde(default)]
    pub created_at: Option<i64>,

    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl WebhookEvent {
    /// The event's data as a checkout, if it is one
    pub fn checkout(&self) -> Option<Checkout> {
        if self.data.get("entity").and_then(Value::as_str) != Some("checkout") {
            return None;
        }
        serde_json::from_value(self.data.clone()).ok()
    }
}

/// What handling an event did
#[derive(Clone, Debug, PartialEq)]
pub enum WebhookOutcome {
    /// Payment marked paid
    Completed(Payment),

    /// Payment marked failed (checkout failed or canceled)
    Canceled(Payment),

    /// Valid event, nothing to settle
    Ignored { reason: &'static str },
}

/// Compute the signature Chargily would send for `payload`
pub fn sign(payload: &[u8], secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::WebhookSignature(e.to_string()))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of `signature` against `payload`
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> Result<()> {
    let expected = hex::decode(signature.trim())
        .map_err(|_| PaymentError::WebhookSignature("signature is not hex".into()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::WebhookSignature(e.to_string()))?;
    mac.update(payload);
    mac.verify_slice(&expected)
        .map_err(|_| PaymentError::WebhookSignature("signature mismatch".into()))
}

/// Webhook handler
pub struct WebhookHandler<S: PaymentStore + ?Sized> {
    store: Arc<S>,
}

impl<S: PaymentStore + ?Sized> WebhookHandler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Verify webhook signature and parse event
    pub fn verify(&self, payload: &[u8], signature: &str, secret: &str) -> Result<WebhookEvent> {
        verify_signature(payload, signature, secret)?;
        serde_json::from_slice(payload).map_err(|e| PaymentError::WebhookParse(e.to_string()))
    }

    /// Settle the payment referenced by a verified event
    pub fn handle(&self, event: &WebhookEvent) -> Result<WebhookOutcome> {
        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            "Processing Chargily webhook"
        );

        let Some(checkout) = event.checkout() else {
            return Ok(WebhookOutcome::Ignored {
                reason: "event data is not a checkout",
            });
        };

        let payment_id = checkout.payment_id().ok_or(PaymentError::MissingMetadata)?;

        let Some(payment) = self.store.find_payment(payment_id)? else {
            tracing::warn!(payment_id, checkout_id = %checkout.id, "Webhook for unknown payment");
            return Ok(WebhookOutcome::Ignored {
                reason: "payment not found",
            });
        };

        Ok(match apply_checkout_status(self.store.as_ref(), payment, &checkout)? {
            Reconciled::Paid(payment) => WebhookOutcome::Completed(payment),
            Reconciled::Failed(payment) => WebhookOutcome::Canceled(payment),
            Reconciled::Unchanged(_) => WebhookOutcome::Ignored {
                reason: "checkout status is not final",
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::{MemoryPaymentStore, NewPayment, PaymentStatus};
    use rust_decimal_macros::dec;
    use serde_json::json;

    const SECRET: &str = "test_sk_8j2TqepMFSz9gDlQ02D0BVZF";

    fn event(data: Value) -> WebhookEvent {
        serde_json::from_value(json!({
            "id": "01hjjrhbxjzg0yxsd9jg3bbnnm",
            "entity": "event",
            "livemode": "false",
            "type": "checkout.paid",
            "data": data,
            "created_at": 1_703_589_876,
            "updated_at": 1_703_589_876,
        }))
        .unwrap()
    }

    fn checkout_data(status: &str, metadata: Value) -> Value {
        json!({
            "id": "01hjjrh8hm0s0ykwrvbcz3ymm8",
            "entity": "checkout",
            "livemode": false,
            "amount": 25000,
            "currency": "dzd",
            "status": status,
            "metadata": metadata,
        })
    }

    fn handler_with_payment() -> (WebhookHandler<MemoryPaymentStore>, Arc<MemoryPaymentStore>) {
        let store = Arc::new(MemoryPaymentStore::new());
        store
            .create_payment(NewPayment {
                user_id: 1,
                currency: "dzd".into(),
                amount: dec!(25000),
            })
            .unwrap();
        (WebhookHandler::new(store.clone()), store)
    }

    #[test]
    fn test_signature_roundtrip() {
        let body = br#"{"id":"evt"}"#;
        let signature = sign(body, SECRET).unwrap();
        assert_eq!(signature.len(), 64);
        assert!(verify_signature(body, &signature, SECRET).is_ok());
    }

    #[test]
    fn test_signature_rejects_tampering() {
        let signature = sign(b"original", SECRET).unwrap();
        assert!(matches!(
            verify_signature(b"tampered", &signature, SECRET),
            Err(PaymentError::WebhookSignature(_))
        ));
        assert!(verify_signature(b"original", &signature, "other").is_err());
        assert!(verify_signature(b"original", "not-hex", SECRET).is_err());
    }

    #[test]
    fn test_verify_parses_event() {
        let (handler, _) = handler_with_payment();
        let body = serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": "checkout.paid",
            "data": checkout_data("paid", json!({"payment_id": 1})),
        }))
        .unwrap();

        let parsed = handler.verify(&body, &sign(&body, SECRET).unwrap(), SECRET).unwrap();
        assert_eq!(parsed.event_type, "checkout.paid");
        assert_eq!(parsed.checkout().unwrap().payment_id(), Some(1));
    }

    #[test]
    fn test_paid_completes_payment() {
        let (handler, store) = handler_with_payment();
        let outcome = handler
            .handle(&event(checkout_data("paid", json!({"payment_id": 1}))))
            .unwrap();

        assert!(matches!(outcome, WebhookOutcome::Completed(ref p) if p.id == 1));
        assert_eq!(store.find_payment(1).unwrap().unwrap().status, PaymentStatus::Paid);
    }

    #[test]
    fn test_failed_and_canceled_cancel_payment() {
        for status in ["failed", "canceled"] {
            let (handler, store) = handler_with_payment();
            let outcome = handler
                .handle(&event(checkout_data(status, json!({"payment_id": "1"}))))
                .unwrap();

            assert!(matches!(outcome, WebhookOutcome::Canceled(_)));
            assert_eq!(store.find_payment(1).unwrap().unwrap().status, PaymentStatus::Failed);
        }
    }

    #[test]
    fn test_missing_metadata() {
        let (handler, _) = handler_with_payment();
        let result = handler.handle(&event(checkout_data("paid", Value::Null)));
        assert!(matches!(result, Err(PaymentError::MissingMetadata)));
    }

    #[test]
    fn test_ignored_events() {
        let (handler, store) = handler_with_payment();

        let not_checkout = handler
            .handle(&event(json!({"entity": "customer", "id": "c"})))
            .unwrap();
        assert!(matches!(not_checkout, WebhookOutcome::Ignored { .. }));

        let unknown = handler
            .handle(&event(checkout_data("paid", json!({"payment_id": 404}))))
            .unwrap();
        assert_eq!(unknown, WebhookOutcome::Ignored { reason: "payment not found" });

        let pending = handler
            .handle(&event(checkout_data("expired", json!({"payment_id": 1}))))
            .unwrap();
        assert!(matches!(pending, WebhookOutcome::Ignored { .. }));
        assert_eq!(store.find_payment(1).unwrap().unwrap().status, PaymentStatus::Pending);
    }
}
