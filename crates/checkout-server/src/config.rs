//! Server Configuration
//!
//! Everything comes from the environment (after `.env` is loaded).

use std::path::PathBuf;

/// Email of the user checkouts are attributed to when nobody is signed in
pub const DEFAULT_FALLBACK_EMAIL: &str = "chargily-test@taleb.local";

/// Server configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Listen address
    pub bind_addr: String,

    /// Externally reachable origin (e.g. an ngrok domain), no trailing slash
    pub public_base_url: Option<String>,

    /// `sqlite:<path>` or `:memory:`; `None` keeps payments in memory
    pub database_url: Option<String>,

    /// Directory holding the built frontend (`/pkg/...`)
    pub static_dir: PathBuf,

    /// Page protocol asset version
    pub asset_version: String,

    pub fallback_email: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            public_base_url: None,
            database_url: None,
            static_dir: PathBuf::from("static"),
            asset_version: env!("CARGO_PKG_VERSION").into(),
            fallback_email: DEFAULT_FALLBACK_EMAIL.into(),
        }
    }
}

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim trailing slashes; empty means unset
pub fn normalize_base_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let public_base_url = non_empty("CHARGILY_PUBLIC_BASE_URL")
            .or_else(|| non_empty("APP_URL"))
            .and_then(|u| normalize_base_url(&u));

        Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            public_base_url,
            database_url: non_empty("DATABASE_URL"),
            static_dir: non_empty("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            asset_version: non_empty("ASSET_VERSION").unwrap_or(defaults.asset_version),
            fallback_email: non_empty("CHARGILY_FALLBACK_EMAIL").unwrap_or(defaults.fallback_email),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://abc.ngrok.app//").as_deref(),
            Some("https://abc.ngrok.app")
        );
        assert_eq!(normalize_base_url("  "), None);
        assert_eq!(normalize_base_url("/"), None);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.fallback_email, DEFAULT_FALLBACK_EMAIL);
        assert!(config.public_base_url.is_none());
    }
}
