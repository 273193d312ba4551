//! Main App Component

use leptos::prelude::*;

use crate::page::{PageObject, RESULT, SUBSCRIBE};
use crate::pages::{ResultPage, SubscribePage};

/// Root application component
#[component]
pub fn App(page: Option<PageObject>) -> impl IntoView {
    let content = match page {
        Some(page) if page.component == SUBSCRIBE => {
            view! { <SubscribePage page_props=page.props /> }.into_any()
        }
        Some(page) if page.component == RESULT => {
            view! { <ResultPage page_props=page.props /> }.into_any()
        }
        _ => view! { <p>"Page not found"</p> }.into_any(),
    };

    view! { <main class="app">{content}</main> }
}
