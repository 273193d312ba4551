//! chargily-checkout Web Frontend
//!
//! Leptos-based WASM pages. The server embeds a page object in
//! `#app[data-page]`; the component it names is mounted here.

mod api;
mod app;
mod components;
mod format;
mod page;
mod pages;

pub use app::App;
pub use page::PageObject;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    let page = page::initial_page();
    leptos::mount::mount_to_body(move || view! { <App page=page /> });
}
