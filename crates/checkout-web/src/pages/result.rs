//! Result Page

use leptos::prelude::*;
use serde_json::Value;

use crate::components::{InfoBlock, Row, StatusBadge};
use crate::format::{pretty, text, timestamp};

fn object(props: &Value, key: &str) -> Option<Value> {
    props.get(key).filter(|v| v.is_object()).cloned()
}

fn checkout_block(checkout: Option<Value>, status: String) -> AnyView {
    let Some(checkout) = checkout else {
        return view! {
            <p class="muted">
                "No checkout was found for this request. If you are testing locally, verify the \
                 checkout_id query parameter and that the return URL matches this server."
            </p>
        }
        .into_any();
    };

    let id = text(&checkout, "id").unwrap_or_else(|| "N/A".into());
    let amount = text(&checkout, "amount");
    let currency = text(&checkout, "currency").map(|c| c.to_uppercase());
    let created = timestamp(&checkout, "created_at");
    let metadata = checkout
        .get("metadata")
        .filter(|m| !m.is_null())
        .map(pretty);

    view! {
        <div class="rows">
            <Row label="Checkout ID">{id}</Row>
            <Row label="Status"><StatusBadge status=status /></Row>
            {amount.map(|a| view! { <Row label="Amount">{a}</Row> })}
            {currency.map(|c| view! { <Row label="Currency">{c}</Row> })}
            {created.map(|t| view! { <Row label="Created">{t}</Row> })}
            {metadata.map(|m| view! {
                <div class="metadata">
                    <p>"Metadata"</p>
                    <pre>{m}</pre>
                </div>
            })}
        </div>
    }
    .into_any()
}

fn payment_block(payment: Option<Value>) -> AnyView {
    let Some(payment) = payment else {
        return view! {
            <p class="muted">
                "No payment record was attached to this checkout. The webhook may not have \
                 reached this server yet."
            </p>
        }
        .into_any();
    };

    let id = text(&payment, "id").unwrap_or_else(|| "N/A".into());
    let status = text(&payment, "status").unwrap_or_else(|| "unknown".into());
    let amount = text(&payment, "amount").unwrap_or_default();
    let currency = text(&payment, "currency").unwrap_or_default().to_uppercase();
    let updated = timestamp(&payment, "updated_at").unwrap_or_else(|| "N/A".into());

    view! {
        <div class="rows">
            <Row label="Payment ID">{id}</Row>
            <Row label="Status"><StatusBadge status=status /></Row>
            <Row label="Amount">{amount}</Row>
            <Row label="Currency">{currency}</Row>
            <Row label="Updated">{updated}</Row>
        </div>
    }
    .into_any()
}

#[component]
pub fn ResultPage(page_props: Value) -> impl IntoView {
    let checkout = object(&page_props, "checkout");
    let payment = object(&page_props, "payment");
    let status = checkout
        .as_ref()
        .and_then(|c| text(c, "status"))
        .unwrap_or_else(|| "pending".into());

    let checkout_view = checkout_block(checkout, status.clone());
    let payment_view = payment_block(payment);

    view! {
        <div class="result">
            <header>
                <div>
                    <p class="eyebrow">"ChargilyPay checkout state"</p>
                    <h1>"Webhook + return status"</h1>
                    <p class="subtitle">
                        "Data shown here is what Chargily reported when it redirected back to this server."
                    </p>
                </div>
                <StatusBadge status=status />
            </header>

            <div class="blocks">
                <InfoBlock title="Checkout payload">{checkout_view}</InfoBlock>
                <InfoBlock title="Stored payment (database)">{payment_view}</InfoBlock>
            </div>

            <nav class="actions">
                <a class="btn btn-primary" href="/chargilypay/subscribe">"Start another checkout"</a>
                <a class="btn" href="https://docs.chargily.com" target="_blank" rel="noreferrer">
                    "View Chargily docs"
                </a>
            </nav>
        </div>
    }
}
