//! API Client

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field → messages, as returned with 422/502
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Body posted to `/chargilypay/redirect`
#[derive(Clone, Debug, Serialize)]
pub struct CheckoutForm {
    pub amount: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: FieldErrors,
}

fn origin() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:3000".into())
}

/// Submit the subscribe form; `Ok` carries the hosted checkout URL
pub async fn submit_checkout(form: &CheckoutForm) -> Result<String, FieldErrors> {
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/chargilypay/redirect", origin()))
        .header("X-Inertia", "true")
        .json(form)
        .send()
        .await
        .map_err(|e| single("payment", e.to_string()))?;

    // 409 + X-Inertia-Location is the page protocol's external redirect
    if response.status().as_u16() == 409 {
        if let Some(url) = response
            .headers()
            .get("x-inertia-location")
            .and_then(|v| v.to_str().ok())
        {
            return Ok(url.to_string());
        }
    }

    let body: ErrorBody = response.json().await.unwrap_or_default();
    if body.errors.is_empty() {
        Err(single(
            "payment",
            body.message.unwrap_or_else(|| "Redirection failed".into()),
        ))
    } else {
        Err(body.errors)
    }
}

fn single(field: &str, message: String) -> FieldErrors {
    BTreeMap::from([(field.to_string(), vec![message])])
}

/// Leave the SPA for `url`
pub fn visit(url: &str) -> Result<(), FieldErrors> {
    let window = web_sys::window().ok_or_else(|| navigation_failed(None))?;
    window
        .location()
        .set_href(url)
        .map_err(|e| navigation_failed(e.as_string()))
}

fn navigation_failed(detail: Option<String>) -> FieldErrors {
    let message = match detail {
        Some(detail) => format!("Could not open the checkout page: {detail}"),
        None => "Could not open the checkout page".to_string(),
    };
    single("payment", message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_failure_reported_on_payment() {
        let errors = navigation_failed(Some("blocked".into()));
        assert_eq!(
            errors["payment"],
            ["Could not open the checkout page: blocked"]
        );

        let errors = navigation_failed(None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["payment"], ["Could not open the checkout page"]);
    }
}
