//! Checkout → payment status reconciliation
//!
//! Shared by the return redirect and the webhook. The latest source wins;
//! there is no transition guard.

use crate::checkout::{Checkout, CheckoutStatus};
use crate::error::Result;
use crate::payment::{Payment, PaymentStatus, PaymentStore};

/// What reconciliation did to the payment
#[derive(Clone, Debug, PartialEq)]
pub enum Reconciled {
    Paid(Payment),
    Failed(Payment),
    /// Checkout is not in a final state we act on
    Unchanged(Payment),
}

impl Reconciled {
    pub fn payment(&self) -> &Payment {
        match self {
            Reconciled::Paid(p) | Reconciled::Failed(p) | Reconciled::Unchanged(p) => p,
        }
    }

    pub fn into_payment(self) -> Payment {
        match self {
            Reconciled::Paid(p) | Reconciled::Failed(p) | Reconciled::Unchanged(p) => p,
        }
    }
}

/// Payment status implied by a checkout status, if any
pub fn target_status(status: CheckoutStatus) -> Option<PaymentStatus> {
    match status {
        CheckoutStatus::Paid => Some(PaymentStatus::Paid),
        CheckoutStatus::Failed | CheckoutStatus::Canceled => Some(PaymentStatus::Failed),
        _ => None,
    }
}

/// Write the status implied by `checkout` onto `payment`
pub fn apply_checkout_status<S>(
    store: &S,
    payment: Payment,
    checkout: &Checkout,
) -> Result<Reconciled>
where
    S: PaymentStore + ?Sized,
{
    let Some(status) = target_status(checkout.status) else {
        tracing::debug!(
            payment_id = payment.id,
            checkout_id = %checkout.id,
            checkout_status = %checkout.status,
            "Checkout not final, payment left as is"
        );
        return Ok(Reconciled::Unchanged(payment));
    };

    let updated = store.update_status(payment.id, status)?;

    tracing::info!(
        payment_id = updated.id,
        checkout_id = %checkout.id,
        from = %payment.status,
        to = %updated.status,
        "Payment status reconciled"
    );

    Ok(match status {
        PaymentStatus::Paid => Reconciled::Paid(updated),
        _ => Reconciled::Failed(updated),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::{MemoryPaymentStore, NewPayment};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn setup() -> (MemoryPaymentStore, Payment) {
        let store = MemoryPaymentStore::new();
        let payment = store
            .create_payment(NewPayment {
                user_id: 1,
                currency: "dzd".into(),
                amount: dec!(25000),
            })
            .unwrap();
        (store, payment)
    }

    fn checkout(status: &str, payment_id: i64) -> Checkout {
        serde_json::from_value(json!({
            "id": "chk_1",
            "status": status,
            "metadata": {"payment_id": payment_id},
        }))
        .unwrap()
    }

    #[test]
    fn test_target_status() {
        assert_eq!(target_status(CheckoutStatus::Paid), Some(PaymentStatus::Paid));
        assert_eq!(target_status(CheckoutStatus::Canceled), Some(PaymentStatus::Failed));
        assert_eq!(target_status(CheckoutStatus::Failed), Some(PaymentStatus::Failed));
        assert_eq!(target_status(CheckoutStatus::Expired), None);
        assert_eq!(target_status(CheckoutStatus::Pending), None);
    }

    #[test]
    fn test_paid() {
        let (store, payment) = setup();
        let paid = checkout("paid", payment.id);
        let result = apply_checkout_status(&store, payment.clone(), &paid).unwrap();

        assert!(matches!(result, Reconciled::Paid(_)));
        assert_eq!(store.find_payment(payment.id).unwrap().unwrap().status, PaymentStatus::Paid);
    }

    #[test]
    fn test_canceled_becomes_failed() {
        let (store, payment) = setup();
        let canceled = checkout("canceled", payment.id);
        let result = apply_checkout_status(&store, payment.clone(), &canceled).unwrap();

        assert_eq!(result.payment().status, PaymentStatus::Failed);
        assert!(matches!(result, Reconciled::Failed(_)));
    }

    #[test]
    fn test_pending_is_unchanged() {
        let (store, payment) = setup();
        let processing = checkout("processing", payment.id);
        let result = apply_checkout_status(&store, payment.clone(), &processing).unwrap();

        assert_eq!(result, Reconciled::Unchanged(payment));
    }

    #[test]
    fn test_later_source_overwrites() {
        let (store, payment) = setup();
        let paid = apply_checkout_status(&store, payment, &checkout("paid", 1)).unwrap();
        let failed =
            apply_checkout_status(&store, paid.into_payment(), &checkout("failed", 1)).unwrap();

        assert_eq!(failed.payment().status, PaymentStatus::Failed);
    }
}
