//! Subscribe Page

use leptos::prelude::*;
use serde_json::Value;

use crate::api::{self, CheckoutForm, FieldErrors};
use crate::format::text;

const DEFAULT_AMOUNT: &str = "25000";
const DEFAULT_CURRENCY: &str = "dzd";

#[component]
fn FieldError(errors: ReadSignal<FieldErrors>, field: &'static str) -> impl IntoView {
    move || {
        errors
            .with(|e| e.get(field).map(|m| m.join(" ")))
            .map(|msg| view! { <span class="error">{msg}</span> })
    }
}

#[component]
pub fn SubscribePage(page_props: Value) -> impl IntoView {
    let (amount, set_amount) =
        signal(text(&page_props, "amount").unwrap_or_else(|| DEFAULT_AMOUNT.into()));
    let (currency, set_currency) =
        signal(text(&page_props, "currency").unwrap_or_else(|| DEFAULT_CURRENCY.into()));
    let (locale, set_locale) = signal(String::from("ar"));
    let (errors, set_errors) = signal(FieldErrors::new());
    let (processing, set_processing) = signal(false);

    let submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if processing.get() {
            return;
        }

        set_processing.set(true);
        set_errors.set(FieldErrors::new());

        let form = CheckoutForm {
            amount: amount.get(),
            currency: currency.get(),
            locale: Some(locale.get()),
        };
        leptos::task::spawn_local(async move {
            let outcome = match api::submit_checkout(&form).await {
                Ok(url) => api::visit(&url),
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                set_errors.set(e);
                set_processing.set(false);
            }
        });
    };

    view! {
        <div class="subscribe">
            <header>
                <p class="eyebrow">"Live Sandbox"</p>
                <h1>"ChargilyPay public subscription test"</h1>
                <p class="subtitle">
                    "Trigger a checkout against Chargily Pay. This page is public, uses test \
                     credentials, and posts to the webhook endpoint configured for this server."
                </p>
                <p class="hint">"Webhook: " <code>"/chargilypay/webhook"</code></p>
            </header>

            <div class="plans">
                <section class="plan featured">
                    <p class="eyebrow">"Trial plan"</p>
                    <div class="price">
                        {move || format!("{} {}", currency.get().to_uppercase(), amount.get())}
                    </div>
                    <p>"A lightweight one-time payment to validate the Chargily Pay flow."</p>
                    <ul>
                        <li>"Redirects to Chargily checkout with your configured webhook."</li>
                        <li>"Amount and currency are editable for quick testing."</li>
                        <li>"Uses a public test user since nobody signs in."</li>
                    </ul>
                </section>

                <form class="plan" on:submit=submit>
                    <h2>"Checkout simulator"</h2>

                    <label>
                        "Amount"
                        <input
                            type="number"
                            min="1"
                            step="100"
                            required=true
                            prop:value=move || amount.get()
                            on:input=move |ev| set_amount.set(event_target_value(&ev))
                        />
                        <FieldError errors=errors field="amount" />
                    </label>

                    <label>
                        "Currency"
                        <select
                            prop:value=move || currency.get()
                            on:change=move |ev| set_currency.set(event_target_value(&ev))
                        >
                            <option value="dzd">"DZD"</option>
                            <option value="eur">"EUR"</option>
                        </select>
                        <FieldError errors=errors field="currency" />
                    </label>

                    <label>
                        "Checkout language"
                        <select
                            prop:value=move || locale.get()
                            on:change=move |ev| set_locale.set(event_target_value(&ev))
                        >
                            <option value="ar">"العربية"</option>
                            <option value="fr">"Français"</option>
                            <option value="en">"English"</option>
                        </select>
                        <FieldError errors=errors field="locale" />
                    </label>

                    <p class="hint">
                        "Local environments need a public tunnel (e.g. ngrok) for Chargily callbacks."
                    </p>

                    <button class="btn btn-primary" type="submit" disabled=move || processing.get()>
                        {move || if processing.get() { "Redirecting…" } else { "Start Chargily checkout" }}
                    </button>
                    <FieldError errors=errors field="payment" />
                </form>
            </div>
        </div>
    }
}
