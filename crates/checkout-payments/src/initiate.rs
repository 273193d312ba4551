//! Checkout initiation
//!
//! Validates the subscribe form, records a pending payment and asks Chargily
//! for a hosted checkout page.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

use crate::checkout::{Checkout, CheckoutMetadata, CreateCheckout, Locale};
use crate::client::CheckoutGateway;
use crate::error::{PaymentError, Result, ValidationErrors};
use crate::payment::{NewPayment, Payment, PaymentStore, User};

/// Path the customer returns to after paying, relative to the public base URL
pub const RETURN_PATH: &str = "/chargilypay/back";

/// Path Chargily posts events to, relative to the public base URL
pub const WEBHOOK_PATH: &str = "/chargilypay/webhook";

/// Raw form as submitted by the browser (JSON or urlencoded)
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub amount: Option<Value>,

    #[serde(default)]
    pub currency: Option<Value>,

    #[serde(default)]
    pub locale: Option<Value>,
}

/// Form after validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedCheckout {
    pub amount: Decimal,
    /// Lowercased
    pub currency: String,
    pub locale: Locale,
}

fn parse_amount(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Blank strings count as absent, like an empty form input
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

impl CheckoutForm {
    /// Check every field and collect all failures
    pub fn validate(&self) -> Result<ValidatedCheckout> {
        let mut errors = ValidationErrors::new();

        let amount = match present(self.amount.as_ref()) {
            None => {
                errors.add("amount", "The amount field is required.");
                None
            }
            Some(value) => match parse_amount(value) {
                None => {
                    errors.add("amount", "The amount field must be a number.");
                    None
                }
                Some(a) if a < Decimal::ONE => {
                    errors.add("amount", "The amount field must be at least 1.");
                    None
                }
                Some(a) if !a.fract().is_zero() => {
                    errors.add("amount", "The amount field must be a whole number.");
                    None
                }
                // Chargily amounts are i64
                Some(a) if a.to_i64().is_none() => {
                    errors.add("amount", "The amount field is too large.");
                    None
                }
                Some(a) => Some(a.normalize()),
            },
        };

        let currency = match present(self.currency.as_ref()) {
            None => {
                errors.add("currency", "The currency field is required.");
                None
            }
            Some(Value::String(s)) => Some(s.trim().to_lowercase()),
            Some(_) => {
                errors.add("currency", "The currency field must be a string.");
                None
            }
        };

        let locale = match present(self.locale.as_ref()) {
            None => Some(Locale::default()),
            Some(Value::String(s)) => {
                let parsed = Locale::parse(s);
                if parsed.is_none() {
                    errors.add("locale", "The locale field must be one of ar, en, fr.");
                }
                parsed
            }
            Some(_) => {
                errors.add("locale", "The locale field must be a string.");
                None
            }
        };

        match (amount, currency, locale) {
            (Some(amount), Some(currency), Some(locale)) if errors.is_empty() => {
                Ok(ValidatedCheckout {
                    amount,
                    currency,
                    locale,
                })
            }
            _ => Err(PaymentError::Validation(errors)),
        }
    }
}

/// A created payment and the checkout the customer should be sent to
#[derive(Clone, Debug)]
pub struct Initiated {
    pub payment: Payment,
    pub checkout: Checkout,
}

impl Initiated {
    pub fn redirect_url(&self) -> Result<&str> {
        self.checkout
            .checkout_url
            .as_deref()
            .ok_or_else(|| PaymentError::Api("No checkout URL returned".into()))
    }
}

/// Build the processor request for an already stored payment
pub fn checkout_request(
    payment: &Payment,
    locale: Locale,
    base_url: &str,
) -> Result<CreateCheckout> {
    let amount = payment
        .amount
        .to_i64()
        .ok_or_else(|| PaymentError::validation("amount", "The amount field is too large."))?;
    let base_url = base_url.trim_end_matches('/');
    let return_url = format!("{base_url}{RETURN_PATH}");

    Ok(CreateCheckout {
        amount,
        currency: payment.currency.clone(),
        locale,
        description: Some(format!("Payment ID={}", payment.id)),
        metadata: CheckoutMetadata {
            payment_id: payment.id,
        },
        success_url: return_url.clone(),
        failure_url: Some(return_url),
        webhook_endpoint: Some(format!("{base_url}{WEBHOOK_PATH}")),
    })
}

/// Record a pending payment for `user` and open a hosted checkout for it
pub async fn initiate<S, G>(
    store: &S,
    gateway: &G,
    user: &User,
    form: ValidatedCheckout,
    base_url: &str,
) -> Result<Initiated>
where
    S: PaymentStore + ?Sized,
    G: CheckoutGateway + ?Sized,
{
    let payment = store.create_payment(NewPayment {
        user_id: user.id,
        currency: form.currency,
        amount: form.amount,
    })?;

    let request = checkout_request(&payment, form.locale, base_url)?;
    let checkout = gateway.create_checkout(&request).await?;

    tracing::info!(
        payment_id = payment.id,
        checkout_id = %checkout.id,
        user_id = user.id,
        amount = %payment.amount,
        currency = %payment.currency,
        "Checkout created"
    );

    let initiated = Initiated { payment, checkout };
    initiated.redirect_url()?;
    Ok(initiated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::{MemoryPaymentStore, PaymentStatus};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::sync::Mutex;

    fn form(value: Value) -> CheckoutForm {
        serde_json::from_value(value).unwrap()
    }

    fn errors(result: Result<ValidatedCheckout>) -> ValidationErrors {
        match result {
            Err(PaymentError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_defaults_locale_and_lowercases_currency() {
        let checkout = form(json!({"amount": 25000, "currency": "DZD"})).validate().unwrap();
        assert_eq!(checkout.amount, dec!(25000));
        assert_eq!(checkout.currency, "dzd");
        assert_eq!(checkout.locale, Locale::Ar);
    }

    #[test]
    fn test_validate_string_amount() {
        let checkout = form(json!({"amount": " 1500 ", "currency": "dzd", "locale": "fr"}))
            .validate()
            .unwrap();
        assert_eq!(checkout.amount, dec!(1500));
        assert_eq!(checkout.locale, Locale::Fr);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let errs = errors(form(json!({"amount": "", "locale": "de"})).validate());
        assert_eq!(errs.get("amount").unwrap(), ["The amount field is required."]);
        assert_eq!(errs.get("currency").unwrap(), ["The currency field is required."]);
        assert_eq!(errs.get("locale").unwrap(), ["The locale field must be one of ar, en, fr."]);
    }

    #[test]
    fn test_validate_amount_rules() {
        let errs = errors(form(json!({"amount": "abc", "currency": "dzd"})).validate());
        assert_eq!(errs.get("amount").unwrap(), ["The amount field must be a number."]);

        let errs = errors(form(json!({"amount": 0, "currency": "dzd"})).validate());
        assert_eq!(errs.get("amount").unwrap(), ["The amount field must be at least 1."]);

        let errs = errors(form(json!({"amount": 10.5, "currency": "dzd"})).validate());
        assert_eq!(errs.get("amount").unwrap(), ["The amount field must be a whole number."]);
    }

    #[test]
    fn test_validate_rejects_amount_beyond_i64() {
        let errs = errors(
            form(json!({"amount": "100000000000000000000", "currency": "dzd"})).validate(),
        );
        assert_eq!(errs.get("amount").unwrap(), ["The amount field is too large."]);

        let max = i64::MAX.to_string();
        let checkout = form(json!({"amount": max, "currency": "dzd"})).validate().unwrap();
        assert_eq!(checkout.amount.to_i64(), Some(i64::MAX));
    }

    #[test]
    fn test_validate_currency_type() {
        let errs = errors(form(json!({"amount": 10, "currency": 5})).validate());
        assert_eq!(errs.get("currency").unwrap(), ["The currency field must be a string."]);
    }

    /// Records requests and answers with a fixed checkout
    struct RecordingGateway {
        requests: Mutex<Vec<CreateCheckout>>,
        url: Option<String>,
    }

    #[async_trait]
    impl CheckoutGateway for RecordingGateway {
        async fn create_checkout(&self, request: &CreateCheckout) -> Result<Checkout> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(serde_json::from_value(json!({
                "id": "chk_1",
                "status": "pending",
                "amount": request.amount,
                "currency": request.currency,
                "metadata": {"payment_id": request.metadata.payment_id},
                "checkout_url": self.url,
            }))
            .unwrap())
        }

        async fn get_checkout(&self, _id: &str) -> Result<Option<Checkout>> {
            Ok(None)
        }

        fn webhook_secret(&self) -> &str {
            "secret"
        }
    }

    fn user() -> User {
        User {
            id: 7,
            name: "Buyer".into(),
            email: "buyer@shop.test".into(),
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_initiate_creates_payment_and_checkout() {
        let store = MemoryPaymentStore::new();
        let gateway = RecordingGateway {
            requests: Mutex::new(Vec::new()),
            url: Some("https://pay.chargily.net/test/checkouts/chk_1/pay".into()),
        };
        let validated = form(json!({"amount": 25000, "currency": "dzd", "locale": "en"}))
            .validate()
            .unwrap();

        let initiated = initiate(&store, &gateway, &user(), validated, "https://shop.test/")
            .await
            .unwrap();

        assert_eq!(initiated.payment.user_id, 7);
        assert_eq!(initiated.payment.status, PaymentStatus::Pending);
        assert_eq!(
            initiated.redirect_url().unwrap(),
            "https://pay.chargily.net/test/checkouts/chk_1/pay"
        );

        let requests = gateway.requests.lock().unwrap();
        let sent = &requests[0];
        assert_eq!(sent.amount, 25000);
        assert_eq!(sent.locale, Locale::En);
        assert_eq!(sent.metadata.payment_id, initiated.payment.id);
        assert_eq!(sent.description.as_deref(), Some("Payment ID=1"));
        assert_eq!(sent.success_url, "https://shop.test/chargilypay/back");
        assert_eq!(sent.failure_url.as_deref(), Some("https://shop.test/chargilypay/back"));
        assert_eq!(
            sent.webhook_endpoint.as_deref(),
            Some("https://shop.test/chargilypay/webhook")
        );
    }

    #[tokio::test]
    async fn test_initiate_without_url_fails_but_keeps_payment() {
        let store = MemoryPaymentStore::new();
        let gateway = RecordingGateway {
            requests: Mutex::new(Vec::new()),
            url: None,
        };
        let validated = form(json!({"amount": 100, "currency": "dzd"})).validate().unwrap();

        let result = initiate(&store, &gateway, &user(), validated, "https://shop.test").await;

        assert!(matches!(result, Err(PaymentError::Api(_))));
        assert!(store.find_payment(1).unwrap().is_some());
    }
}
