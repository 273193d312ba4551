//! UI Components

use leptos::prelude::*;

fn tone(status: &str) -> &'static str {
    match status {
        "paid" => "success",
        "pending" | "processing" => "warning",
        "failed" | "canceled" | "expired" => "danger",
        _ => "neutral",
    }
}

/// Pill showing a checkout or payment status
#[component]
pub fn StatusBadge(#[prop(into)] status: String) -> impl IntoView {
    let class = format!("badge badge-{}", tone(&status));

    view! {
        <span class=class>
            <span class="dot"></span>
            {status}
        </span>
    }
}

/// Titled card
#[component]
pub fn InfoBlock(title: &'static str, children: Children) -> impl IntoView {
    view! {
        <section class="info-block">
            <h3>{title}</h3>
            {children()}
        </section>
    }
}

/// Label/value line inside an `InfoBlock`
#[component]
pub fn Row(label: &'static str, children: Children) -> impl IntoView {
    view! {
        <div class="row">
            <span class="label">{label}</span>
            <span class="value">{children()}</span>
        </div>
    }
}
