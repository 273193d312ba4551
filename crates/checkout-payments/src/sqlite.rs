//! SQLite Payment Store

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::error::{PaymentError, Result};
use crate::payment::{NewPayment, Payment, PaymentStatus, PaymentStore, User};

/// Raw `payments` row before parsing text columns
type PaymentRow = (i64, i64, String, String, String, String, String);

/// Payment store backed by a single SQLite connection
pub struct SqlitePaymentStore {
    conn: Mutex<Connection>,
}

impl SqlitePaymentStore {
    /// Open (or create) the database at `path` and run migrations.
    ///
    /// Accepts a bare path, `sqlite:<path>` or `:memory:`.
    pub fn open(database_url: &str) -> Result<Self> {
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);
        info!("Opening payment database at {}", path);

        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PaymentError::Storage(e.to_string()))?;
            }
        }

        let conn = Connection::open(path)?;
        Self::run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    fn run_migrations(conn: &Connection) -> Result<()> {
        debug!("Running payment database migrations...");

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS payments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                status TEXT NOT NULL DEFAULT 'pending',
                currency TEXT NOT NULL,
                amount TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_payments_user_id ON payments(user_id);
            "#,
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PaymentError::Storage("connection lock poisoned".into()))
    }

    fn select_payment(conn: &Connection, id: i64) -> Result<Option<Payment>> {
        let row: Option<PaymentRow> = conn
            .query_row(
                "SELECT id, user_id, status, currency, amount, created_at, updated_at
                 FROM payments WHERE id = ?1",
                [id],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                    ))
                },
            )
            .optional()?;

        row.map(payment_from_row).transpose()
    }
}

fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| PaymentError::Storage(format!("bad timestamp '{s}': {e}")))
}

fn payment_from_row(row: PaymentRow) -> Result<Payment> {
    let (id, user_id, status, currency, amount, created_at, updated_at) = row;
    Ok(Payment {
        id,
        user_id,
        status: PaymentStatus::parse(&status)?,
        currency,
        amount: Decimal::from_str(&amount)
            .map_err(|e| PaymentError::Storage(format!("bad amount '{amount}': {e}")))?,
        created_at: parse_time(&created_at)?,
        updated_at: parse_time(&updated_at)?,
    })
}

impl PaymentStore for SqlitePaymentStore {
    fn create_payment(&self, new: NewPayment) -> Result<Payment> {
        let conn = self.lock()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO payments (user_id, status, currency, amount, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                new.user_id,
                PaymentStatus::Pending.as_str(),
                new.currency,
                new.amount.to_string(),
                now.to_rfc3339(),
            ],
        )?;
        let id = conn.last_insert_rowid();

        debug!(payment_id = id, "DB: created payment");

        Ok(Payment {
            id,
            user_id: new.user_id,
            status: PaymentStatus::Pending,
            currency: new.currency,
            amount: new.amount,
            created_at: now,
            updated_at: now,
        })
    }

    fn find_payment(&self, id: i64) -> Result<Option<Payment>> {
        let conn = self.lock()?;
        Self::select_payment(&conn, id)
    }

    fn update_status(&self, id: i64, status: PaymentStatus) -> Result<Payment> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE payments SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().to_rfc3339(), id],
        )?;

        if changed == 0 {
            return Err(PaymentError::PaymentNotFound(id));
        }

        Self::select_payment(&conn, id)?.ok_or(PaymentError::PaymentNotFound(id))
    }

    fn first_or_create_user(&self, email: &str, name: &str) -> Result<User> {
        let conn = self.lock()?;

        let existing: Option<(i64, String, String)> = conn
            .query_row(
                "SELECT id, name, created_at FROM users WHERE email = ?1",
                [email],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        if let Some((id, name, created_at)) = existing {
            return Ok(User {
                id,
                name,
                email: email.to_string(),
                created_at: parse_time(&created_at)?,
            });
        }

        let now = Utc::now();
        conn.execute(
            "INSERT INTO users (name, email, created_at) VALUES (?1, ?2, ?3)",
            params![name, email, now.to_rfc3339()],
        )?;

        info!("DB: Created new user: email={}", email);

        Ok(User {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            email: email.to_string(),
            created_at: now,
        })
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
