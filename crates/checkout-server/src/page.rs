//! Page Protocol
//!
//! Inertia-compatible page objects: JSON for client-side visits, an HTML shell
//! with the page embedded for first loads, and 409 + `X-Inertia-Location` for
//! redirects that must leave the SPA.

use std::convert::Infallible;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header, request::Parts},
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

pub const X_INERTIA: &str = "x-inertia";
pub const X_INERTIA_VERSION: &str = "x-inertia-version";
pub const X_INERTIA_LOCATION: &str = "x-inertia-location";

/// What the page protocol needs to know about an incoming request
#[derive(Clone, Debug)]
pub struct PageRequest {
    /// `X-Inertia: true` was sent
    pub is_inertia: bool,

    /// Client's asset version
    pub version: Option<String>,

    /// Path and query of the request
    pub url: String,

    pub method: Method,
}

impl<S> FromRequestParts<S> for PageRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers, &parts.method, &parts.uri))
    }
}

impl PageRequest {
    pub fn from_headers(headers: &HeaderMap, method: &Method, uri: &axum::http::Uri) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Self {
            is_inertia: header(X_INERTIA).is_some_and(|v| v.eq_ignore_ascii_case("true")),
            version: header(X_INERTIA_VERSION),
            url: uri
                .path_and_query()
                .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string()),
            method: method.clone(),
        }
    }
}

/// A rendered page
#[derive(Clone, Debug, Serialize)]
pub struct Page {
    pub component: &'static str,
    pub props: Value,
    pub url: String,
    pub version: String,
}

impl Page {
    pub fn new(
        component: &'static str,
        props: Value,
        request: &PageRequest,
        version: &str,
    ) -> Self {
        Self {
            component,
            props,
            url: request.url.clone(),
            version: version.to_string(),
        }
    }

    /// Respond in whichever form the request asked for
    pub fn render(self, request: &PageRequest) -> Response {
        if request.is_inertia {
            let stale = request.method == Method::GET
                && request.version.as_deref().is_some_and(|v| v != self.version);
            if stale {
                tracing::debug!(url = %request.url, "Asset version changed, forcing full reload");
                return external_location(&request.url);
            }

            let mut response = Json(&self).into_response();
            let headers = response.headers_mut();
            headers.insert(X_INERTIA, HeaderValue::from_static("true"));
            headers.insert(header::VARY, HeaderValue::from_static("X-Inertia"));
            return response;
        }

        match serde_json::to_string(&self) {
            Ok(json) => Html(shell(&json, &self.version)).into_response(),
            Err(e) => {
                tracing::error!("Page serialization failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Send the browser to `url`, leaving the SPA when needed
pub fn location(request: &PageRequest, url: &str) -> Response {
    if request.is_inertia {
        external_location(url)
    } else {
        see_other(url)
    }
}

fn header_value(url: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(url)
        .inspect_err(|e| tracing::error!(url, "Invalid redirect target: {}", e))
        .ok()
}

fn external_location(url: &str) -> Response {
    match header_value(url) {
        Some(value) => (StatusCode::CONFLICT, [(X_INERTIA_LOCATION, value)]).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

fn see_other(url: &str) -> Response {
    match header_value(url) {
        Some(value) => (StatusCode::SEE_OTHER, [(header::LOCATION, value)]).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn shell(page_json: &str, version: &str) -> String {
    let page = escape_attr(page_json);
    let version = escape_attr(version);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>ChargilyPay</title>
    <link rel="stylesheet" href="/app.css?v={version}">
</head>
<body>
    <div id="app" data-page="{page}"></div>
    <script type="module">
        import init from '/pkg/checkout_web.js?v={version}';
        init();
    </script>
</body>
</html>
"#
    )
}
