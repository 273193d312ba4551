//! Chargily Pay Checkout Types
//!
//! Request and response shapes for the `/checkouts` resource.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Lifecycle status reported by Chargily for a checkout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStatus {
    #[default]
    Pending,
    Processing,
    Paid,
    Failed,
    Canceled,
    Expired,
    #[serde(other)]
    Unknown,
}

impl CheckoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStatus::Pending => "pending",
            CheckoutStatus::Processing => "processing",
            CheckoutStatus::Paid => "paid",
            CheckoutStatus::Failed => "failed",
            CheckoutStatus::Canceled => "canceled",
            CheckoutStatus::Expired => "expired",
            CheckoutStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CheckoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language of the hosted checkout page
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ar,
    En,
    Fr,
}

impl Locale {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ar" => Some(Locale::Ar),
            "en" => Some(Locale::En),
            "fr" => Some(Locale::Fr),
            _ => None,
        }
    }
}

/// Metadata attached to every checkout we create
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutMetadata {
    pub payment_id: i64,
}

/// Body of `POST /checkouts`
#[derive(Clone, Debug, Serialize)]
pub struct CreateCheckout {
    /// Whole units of `currency`
    pub amount: i64,

    pub currency: String,

    pub locale: Locale,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub metadata: CheckoutMetadata,

    /// Where the customer lands after a successful payment
    pub success_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_endpoint: Option<String>,
}

/// A checkout as returned by the API and embedded in webhook events
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkout {
    pub id: String,

    #[serde(default)]
    pub entity: Option<String>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub livemode: bool,

    #[serde(default)]
    pub status: CheckoutStatus,

    #[serde(default)]
    pub amount: Option<i64>,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub locale: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Echo of what we sent; shape is not guaranteed by the API
    #[serde(default)]
    pub metadata: Value,

    #[serde(default)]
    pub checkout_url: Option<String>,

    #[serde(default)]
    pub success_url: Option<String>,

    #[serde(default)]
    pub failure_url: Option<String>,

    #[serde(default)]
    pub webhook_endpoint: Option<String>,

    /// Unix seconds
    #[serde(default)]
    pub created_at: Option<i64>,

    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl Checkout {
    /// The `payment_id` we stored in metadata, if it survived the round trip.
    ///
    /// Accepts an object, or a list of objects, holding an integer or numeric
    /// string.
    pub fn payment_id(&self) -> Option<i64> {
        fn from_object(value: &Value) -> Option<i64> {
            match value.get("payment_id")? {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }
        }

        match &self.metadata {
            Value::Object(_) => from_object(&self.metadata),
            Value::Array(items) => items.iter().find_map(from_object),
            _ => None,
        }
    }
}

/// Chargily sends `livemode` as a bool on resources and as a string on events.
fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn checkout(metadata: Value) -> Checkout {
        serde_json::from_value(json!({
            "id": "01hj5n7cqpaf0mt2d0xx85tgz8",
            "entity": "checkout",
            "livemode": false,
            "status": "paid",
            "amount": 25000,
            "currency": "dzd",
            "metadata": metadata,
        }))
        .unwrap()
    }

    #[test]
    fn test_payment_id_from_object() {
        assert_eq!(checkout(json!({"payment_id": 42})).payment_id(), Some(42));
        assert_eq!(checkout(json!({"payment_id": "7"})).payment_id(), Some(7));
    }

    #[test]
    fn test_payment_id_from_list() {
        let c = checkout(json!([{"other": 1}, {"payment_id": 9}]));
        assert_eq!(c.payment_id(), Some(9));
    }

    #[test]
    fn test_payment_id_missing() {
        assert_eq!(checkout(Value::Null).payment_id(), None);
        assert_eq!(checkout(json!({"order": 3})).payment_id(), None);
        assert_eq!(checkout(json!({"payment_id": "abc"})).payment_id(), None);
    }

    #[test]
    fn test_unknown_status_and_string_livemode() {
        let c: Checkout = serde_json::from_value(json!({
            "id": "x",
            "livemode": "true",
            "status": "refunded",
        }))
        .unwrap();
        assert!(c.livemode);
        assert_eq!(c.status, CheckoutStatus::Unknown);
        assert_eq!(c.metadata, Value::Null);
    }

    #[test]
    fn test_create_checkout_body() {
        let body = serde_json::to_value(CreateCheckout {
            amount: 25000,
            currency: "dzd".into(),
            locale: Locale::Fr,
            description: Some("Payment ID=1".into()),
            metadata: CheckoutMetadata { payment_id: 1 },
            success_url: "https://shop.test/chargilypay/back".into(),
            failure_url: None,
            webhook_endpoint: None,
        })
        .unwrap();

        assert_eq!(body["locale"], "fr");
        assert_eq!(body["metadata"]["payment_id"], 1);
        assert!(body.get("failure_url").is_none());
    }

    #[test]
    fn test_locale_parse() {
        assert_eq!(Locale::parse(" EN "), Some(Locale::En));
        assert_eq!(Locale::parse("de"), None);
    }
}
