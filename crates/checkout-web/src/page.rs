//! Page object handed over by the server

use serde::Deserialize;
use serde_json::Value;

pub const SUBSCRIBE: &str = "chargilypay/subscribe";
pub const RESULT: &str = "chargilypay/result";

#[derive(Clone, Debug, Deserialize)]
pub struct PageObject {
    pub component: String,
    #[serde(default)]
    pub props: Value,
    pub url: String,
    #[serde(default)]
    pub version: String,
}

/// Read the page object from the mount element
pub fn initial_page() -> Option<PageObject> {
    let data = web_sys::window()?
        .document()?
        .get_element_by_id("app")?
        .get_attribute("data-page")?;
    parse(&data)
}

pub fn parse(data: &str) -> Option<PageObject> {
    serde_json::from_str(data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page() {
        let page = parse(
            r#"{"component":"chargilypay/subscribe","props":{"amount":25000},"url":"/chargilypay/subscribe","version":"0.1.0"}"#,
        )
        .unwrap();
        assert_eq!(page.component, SUBSCRIBE);
        assert_eq!(page.props["amount"], 25000);
        assert!(parse("not json").is_none());
    }
}
