//! # Accounting Store
//!
//! Invoices, invoice lines, payments and the reference data they need
//! (cash journal, inbound payment method).
//!
//! ## Invoice Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InvoiceDraft (venue-core)                                             │
//! │       │ insert_posted_invoice: number from the `invoice` sequence      │
//! │       ▼                                                                 │
//! │  invoices (state = posted) + invoice_lines                             │
//! │       │ insert_payment (cash journal, manual inbound method)           │
//! │       ▼                                                                 │
//! │  payments ──► SUM(amount_cents) ──► PaymentState                       │
//! │                                     not_paid / partial / paid          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here takes a connection so the billing workflow can run it
//! inside one transaction.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;
use venue_core::billing::{check_postable, InvoiceBalance, InvoiceDraft};
use venue_core::{
    CoreError, Invoice, InvoiceLine, InvoiceState, Journal, Money, Payment, PaymentMethod,
    PaymentState, TargetKind,
};

use super::sequence::{next_reference, INVOICE_SEQUENCE};
use crate::error::{DbError, DbResult};

const INVOICE_COLUMNS: &str = "id, number, target_kind, target_id, customer, reference, \
                               invoice_date, currency, state, amount_total_cents, created_at, posted_at";

const PAYMENT_COLUMNS: &str =
    "id, invoice_id, journal_id, payment_method_id, amount_cents, payment_date, created_at";

// =============================================================================
// Invoices
// =============================================================================

pub async fn get_invoice(conn: &mut SqliteConnection, id: &str) -> DbResult<Invoice> {
    let sql = format!("SELECT {} FROM invoices WHERE id = ?1", INVOICE_COLUMNS);
    sqlx::query_as::<_, Invoice>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Invoice", id))
}

/// Invoices of one target, newest first.
pub async fn invoices_for(
    conn: &mut SqliteConnection,
    kind: TargetKind,
    target_id: &str,
) -> DbResult<Vec<Invoice>> {
    let sql = format!(
        r#"
        SELECT {} FROM invoices
        WHERE target_kind = ?1 AND target_id = ?2
        ORDER BY created_at DESC, number DESC
        "#,
        INVOICE_COLUMNS
    );
    let invoices = sqlx::query_as::<_, Invoice>(&sql)
        .bind(kind)
        .bind(target_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(invoices)
}

pub async fn invoice_lines(conn: &mut SqliteConnection, invoice_id: &str) -> DbResult<Vec<InvoiceLine>> {
    let lines = sqlx::query_as::<_, InvoiceLine>(
        r#"
        SELECT id, invoice_id, product_id, label, quantity, unit_price_cents, discount_bps, subtotal_cents
        FROM invoice_lines
        WHERE invoice_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(invoice_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(lines)
}

/// Sum of payments registered on an invoice.
pub async fn paid_amount(conn: &mut SqliteConnection, invoice_id: &str) -> DbResult<Money> {
    let cents: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(amount_cents), 0) FROM payments WHERE invoice_id = ?1")
            .bind(invoice_id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(Money::from_cents(cents))
}

/// The target's most recent posted invoice with what has been paid on it.
pub async fn latest_balance(
    conn: &mut SqliteConnection,
    kind: TargetKind,
    target_id: &str,
) -> DbResult<Option<InvoiceBalance>> {
    let sql = format!(
        r#"
        SELECT {} FROM invoices
        WHERE target_kind = ?1 AND target_id = ?2 AND state = 'posted'
        ORDER BY created_at DESC, number DESC
        LIMIT 1
        "#,
        INVOICE_COLUMNS
    );
    let invoice = sqlx::query_as::<_, Invoice>(&sql)
        .bind(kind)
        .bind(target_id)
        .fetch_optional(&mut *conn)
        .await?;

    match invoice {
        Some(invoice) => {
            let paid = paid_amount(conn, &invoice.id).await?;
            Ok(Some(InvoiceBalance::new(invoice, paid)))
        }
        None => Ok(None),
    }
}

/// Payment status of a target; `None` until it is invoiced.
pub async fn payment_status(
    conn: &mut SqliteConnection,
    kind: TargetKind,
    target_id: &str,
) -> DbResult<Option<PaymentState>> {
    Ok(latest_balance(conn, kind, target_id)
        .await?
        .map(|balance| balance.payment_state))
}

/// Writes and posts an invoice in one step.
///
/// ## Errors
/// `InvoicePosting` for a draft without lines.
pub async fn insert_posted_invoice(
    conn: &mut SqliteConnection,
    draft: &InvoiceDraft,
    now: DateTime<Utc>,
) -> DbResult<Invoice> {
    check_postable(draft)?;

    let number = next_reference(conn, INVOICE_SEQUENCE).await?;
    let invoice = Invoice {
        id: Uuid::new_v4().to_string(),
        number,
        target_kind: draft.target.kind,
        target_id: draft.target.id.clone(),
        customer: draft.customer.clone(),
        reference: draft.reference.clone(),
        invoice_date: draft.invoice_date,
        currency: draft.currency.clone(),
        state: InvoiceState::Posted,
        amount_total_cents: draft.amount_total().cents(),
        created_at: now,
        posted_at: Some(now),
    };

    debug!(number = %invoice.number, reference = %invoice.reference, "Posting invoice");

    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, number, target_kind, target_id, customer, reference,
            invoice_date, currency, state, amount_total_cents, created_at, posted_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.number)
    .bind(invoice.target_kind)
    .bind(&invoice.target_id)
    .bind(&invoice.customer)
    .bind(&invoice.reference)
    .bind(invoice.invoice_date)
    .bind(&invoice.currency)
    .bind(invoice.state)
    .bind(invoice.amount_total_cents)
    .bind(invoice.created_at)
    .bind(invoice.posted_at)
    .execute(&mut *conn)
    .await?;

    for line in &draft.lines {
        sqlx::query(
            r#"
            INSERT INTO invoice_lines (
                id, invoice_id, product_id, label, quantity,
                unit_price_cents, discount_bps, subtotal_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&invoice.id)
        .bind(&line.product_id)
        .bind(&line.label)
        .bind(line.quantity)
        .bind(line.unit_price.cents())
        .bind(line.discount.bps())
        .bind(line.subtotal().cents())
        .execute(&mut *conn)
        .await?;
    }

    Ok(invoice)
}

// =============================================================================
// Payments
// =============================================================================

/// The cash journal payments are registered on.
pub async fn cash_journal(conn: &mut SqliteConnection) -> DbResult<Journal> {
    sqlx::query_as::<_, Journal>(
        r#"
        SELECT id, code, name, journal_type FROM journals
        WHERE journal_type = 'cash'
        ORDER BY code
        LIMIT 1
        "#,
    )
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| CoreError::MissingConfiguration("cash journal".to_string()).into())
}

/// The manual inbound payment method of `journal`.
pub async fn inbound_method(conn: &mut SqliteConnection, journal: &Journal) -> DbResult<PaymentMethod> {
    sqlx::query_as::<_, PaymentMethod>(
        r#"
        SELECT id, journal_id, code, name, direction FROM payment_methods
        WHERE journal_id = ?1 AND code = 'manual' AND direction = 'inbound'
        LIMIT 1
        "#,
    )
    .bind(&journal.id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| {
        CoreError::MissingConfiguration(format!("inbound payment method on journal {}", journal.code))
            .into()
    })
}

/// Registers a cash payment on an invoice.
pub async fn insert_payment(
    conn: &mut SqliteConnection,
    invoice: &Invoice,
    amount: Money,
    payment_date: NaiveDate,
    now: DateTime<Utc>,
) -> DbResult<Payment> {
    if !amount.is_positive() {
        return Err(CoreError::InvalidPaymentAmount {
            reason: "paid amount must be positive".to_string(),
        }
        .into());
    }

    let journal = cash_journal(conn).await?;
    let method = inbound_method(conn, &journal).await?;

    let payment = Payment {
        id: Uuid::new_v4().to_string(),
        invoice_id: invoice.id.clone(),
        journal_id: journal.id,
        payment_method_id: method.id,
        amount_cents: amount.cents(),
        payment_date,
        created_at: now,
    };

    debug!(invoice = %invoice.number, amount_cents = payment.amount_cents, "Registering payment");

    sqlx::query(
        r#"
        INSERT INTO payments (id, invoice_id, journal_id, payment_method_id, amount_cents, payment_date, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.invoice_id)
    .bind(&payment.journal_id)
    .bind(&payment.payment_method_id)
    .bind(payment.amount_cents)
    .bind(payment.payment_date)
    .bind(payment.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(payment)
}

/// Payments of one invoice, oldest first.
pub async fn payments_for(conn: &mut SqliteConnection, invoice_id: &str) -> DbResult<Vec<Payment>> {
    let sql = format!(
        "SELECT {} FROM payments WHERE invoice_id = ?1 ORDER BY created_at, id",
        PAYMENT_COLUMNS
    );
    let payments = sqlx::query_as::<_, Payment>(&sql)
        .bind(invoice_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(payments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::test_db;

    #[tokio::test]
    async fn test_missing_cash_journal_is_a_configuration_error() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        sqlx::query("DELETE FROM payment_methods").execute(&mut *conn).await.unwrap();
        sqlx::query("DELETE FROM journals").execute(&mut *conn).await.unwrap();

        let err = cash_journal(&mut conn).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::MissingConfiguration(_))));
    }

    #[tokio::test]
    async fn test_seeded_payment_method() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let journal = cash_journal(&mut conn).await.unwrap();
        assert_eq!(journal.code, "CSH");
        let method = inbound_method(&mut conn, &journal).await.unwrap();
        assert_eq!(method.code, "manual");
    }

    #[tokio::test]
    async fn test_uninvoiced_target_has_no_status() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let status = payment_status(&mut conn, TargetKind::Session, "nope").await.unwrap();
        assert_eq!(status, None);
    }
}
