//! Payment Records
//!
//! A payment row is created before the customer is sent to Chargily and its
//! status is later settled from the return redirect or a webhook.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{PaymentError, Result};

/// Stored payment status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(PaymentError::Storage(format!("unknown payment status '{other}'"))),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,

    /// Paying user
    pub user_id: i64,

    pub status: PaymentStatus,

    /// Lowercase ISO code, e.g. `dzd`
    pub currency: String,

    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a payment
#[derive(Clone, Debug)]
pub struct NewPayment {
    pub user_id: i64,
    pub currency: String,
    pub amount: Decimal,
}

/// The user a payment is attributed to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Payment storage trait
pub trait PaymentStore: Send + Sync {
    /// Insert a new `pending` payment
    fn create_payment(&self, new: NewPayment) -> Result<Payment>;

    /// Get payment by id
    fn find_payment(&self, id: i64) -> Result<Option<Payment>>;

    /// Overwrite the status of an existing payment
    fn update_status(&self, id: i64, status: PaymentStatus) -> Result<Payment>;

    /// Look a user up by email, creating it with `name` if absent
    fn first_or_create_user(&self, email: &str, name: &str) -> Result<User>;

    /// Short backend name for health output
    fn backend(&self) -> &'static str;
}

fn poisoned<T>(_: T) -> PaymentError {
    PaymentError::Storage("lock poisoned".into())
}

#[derive(Default)]
struct Tables {
    payments: HashMap<i64, Payment>,
    users: HashMap<i64, User>,
    next_payment_id: i64,
    next_user_id: i64,
}

/// In-memory payment store (for development and tests)
#[derive(Default)]
pub struct MemoryPaymentStore {
    tables: RwLock<Tables>,
}

impl MemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentStore for MemoryPaymentStore {
    fn create_payment(&self, new: NewPayment) -> Result<Payment> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.next_payment_id += 1;

        let now = Utc::now();
        let payment = Payment {
            id: tables.next_payment_id,
            user_id: new.user_id,
            status: PaymentStatus::Pending,
            currency: new.currency,
            amount: new.amount,
            created_at: now,
            updated_at: now,
        };
        tables.payments.insert(payment.id, payment.clone());

        Ok(payment)
    }

    fn find_payment(&self, id: i64) -> Result<Option<Payment>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.payments.get(&id).cloned())
    }

    fn update_status(&self, id: i64, status: PaymentStatus) -> Result<Payment> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let payment = tables
            .payments
            .get_mut(&id)
            .ok_or(PaymentError::PaymentNotFound(id))?;

        payment.status = status;
        payment.updated_at = Utc::now();
        Ok(payment.clone())
    }

    fn first_or_create_user(&self, email: &str, name: &str) -> Result<User> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        if let Some(user) = tables.users.values().find(|u| u.email == email) {
            return Ok(user.clone());
        }

        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            name: name.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
