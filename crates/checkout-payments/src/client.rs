//! Chargily Pay API Client
//!
//! Thin REST client over the v2 API. Only the checkout resource is used.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::checkout::{Checkout, CreateCheckout};
use crate::error::{PaymentError, Result};

const TEST_BASE_URL: &str = "https://pay.chargily.net/test/api/v2";
const LIVE_BASE_URL: &str = "https://pay.chargily.net/api/v2";

/// API environment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Test,
    Live,
}

impl Mode {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "test" => Ok(Mode::Test),
            "live" => Ok(Mode::Live),
            other => Err(PaymentError::Config(format!(
                "CHARGILY_MODE must be 'test' or 'live', got '{other}'"
            ))),
        }
    }

    pub fn base_url(self) -> &'static str {
        match self {
            Mode::Test => TEST_BASE_URL,
            Mode::Live => LIVE_BASE_URL,
        }
    }
}

/// API key pair
#[derive(Clone)]
pub struct Credentials {
    pub mode: Mode,
    pub public_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("mode", &self.mode)
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let mode = match std::env::var("CHARGILY_MODE") {
            Ok(m) => Mode::parse(&m)?,
            Err(_) => Mode::Test,
        };
        let public_key = std::env::var("CHARGILY_PUBLIC_KEY")
            .map_err(|_| PaymentError::Config("CHARGILY_PUBLIC_KEY not set".into()))?;
        let secret_key = std::env::var("CHARGILY_SECRET_KEY")
            .map_err(|_| PaymentError::Config("CHARGILY_SECRET_KEY not set".into()))?;

        Ok(Self {
            mode,
            public_key,
            secret_key,
        })
    }
}

/// The subset of the processor API the checkout flow depends on
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Create a hosted checkout and return it (including `checkout_url`)
    async fn create_checkout(&self, request: &CreateCheckout) -> Result<Checkout>;

    /// Fetch a checkout by id; `None` if the API does not know it
    async fn get_checkout(&self, id: &str) -> Result<Option<Checkout>>;

    /// Key used to sign webhook payloads
    fn webhook_secret(&self) -> &str;
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// reqwest-backed Chargily Pay client
pub struct ChargilyClient {
    http: reqwest::Client,
    credentials: Credentials,
    base_url: String,
}

impl ChargilyClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        let base_url = credentials.mode.base_url().to_string();
        Self::with_base_url(credentials, base_url)
    }

    /// Point the client at another host (sandbox proxies, tests)
    pub fn with_base_url(credentials: Credentials, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(Credentials::from_env()?)
    }

    pub fn mode(&self) -> Mode {
        self.credentials.mode
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn api_error(response: reqwest::Response) -> PaymentError {
        let status = response.status();
        let message = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
        PaymentError::Api(format!("{status}: {message}"))
    }
}

#[async_trait]
impl CheckoutGateway for ChargilyClient {
    async fn create_checkout(&self, request: &CreateCheckout) -> Result<Checkout> {
        tracing::debug!(
            payment_id = request.metadata.payment_id,
            amount = request.amount,
            currency = %request.currency,
            "Creating Chargily checkout"
        );

        let response = self
            .http
            .post(self.url("checkouts"))
            .bearer_auth(&self.credentials.secret_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let checkout: Checkout = response.json().await?;
        if checkout.checkout_url.is_none() {
            return Err(PaymentError::Api("No checkout URL returned".into()));
        }
        Ok(checkout)
    }

    async fn get_checkout(&self, id: &str) -> Result<Option<Checkout>> {
        let response = self
            .http
            .get(self.url(&format!("checkouts/{id}")))
            .bearer_auth(&self.credentials.secret_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(response.json().await?)),
            _ => Err(Self::api_error(response).await),
        }
    }

    fn webhook_secret(&self) -> &str {
        &self.credentials.secret_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            mode: Mode::Test,
            public_key: "test_pk_abc".into(),
            secret_key: "test_sk_xyz".into(),
        }
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse("LIVE").unwrap(), Mode::Live);
        assert_eq!(Mode::parse("test").unwrap(), Mode::Test);
        assert!(matches!(Mode::parse("prod"), Err(PaymentError::Config(_))));
    }

    #[test]
    fn test_base_urls() {
        assert!(Mode::Test.base_url().ends_with("/test/api/v2"));
        assert!(!Mode::Live.base_url().contains("/test/"));
    }

    #[test]
    fn test_secret_redacted_in_debug() {
        let debug = format!("{:?}", credentials());
        assert!(debug.contains("test_pk_abc"));
        assert!(!debug.contains("test_sk_xyz"));
    }

    #[test]
    fn test_url_join() {
        let client =
            ChargilyClient::with_base_url(credentials(), "http://localhost:9000/api/").unwrap();
        assert_eq!(client.url("/checkouts"), "http://localhost:9000/api/checkouts");
        assert_eq!(client.webhook_secret(), "test_sk_xyz");
    }
}
