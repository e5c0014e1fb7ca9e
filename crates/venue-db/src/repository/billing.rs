//! # Billing Repository
//!
//! Turns a finished session or café order into a posted invoice and,
//! depending on the chosen payment way, a cash payment.
//!
//! ## Confirmation Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. lock target row (first write)                                     │
//! │   2. load target detail → check_billable (finished only)               │
//! │   3. latest posted invoice + payments → InvoiceBalance                 │
//! │   4. plan_billing(decision, balance)                                   │
//! │        Create → build_invoice → insert_posted_invoice (INV/xxxxx)      │
//! │        Reuse  → existing invoice                                       │
//! │   5. payment: none │ residual │ amount  (cash journal, manual inbound) │
//! │  COMMIT   ← any failure above rolls everything back                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use venue_core::billing::{
    billing_draft, build_invoice, check_billable, plan_billing, BillingDecision, BillingDraft,
    InvoiceBalance, InvoiceStep, PaymentStep,
};
use venue_core::{
    BillingTarget, InvoiceLine, Money, Payment, TargetKind, TargetRef, DEFAULT_CURRENCY,
};

use super::cafe_order::{fetch_order, load_cafe_detail};
use super::invoice::{
    get_invoice, insert_payment, insert_posted_invoice, invoice_lines, invoices_for,
    latest_balance, paid_amount,
};
use super::product::time_product;
use super::session::{fetch_session, load_session_detail};
use crate::error::{DbError, DbResult};

type Target = Box<dyn BillingTarget + Send + Sync>;

/// Result of a confirmed billing decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingOutcome {
    pub invoice: InvoiceBalance,
    pub lines: Vec<InvoiceLine>,
    /// Payment registered by this confirmation, if any.
    pub payment: Option<Payment>,
    /// Whether this confirmation created the invoice.
    pub created_invoice: bool,
}

/// Repository for the billing workflow.
///
/// ## Usage
/// ```rust,ignore
/// let billing = db.billing("EGP");
/// let draft = billing.start_billing(&TargetRef::session(id)).await?;
/// let outcome = billing.confirm(&decision).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: SqlitePool,
    currency: String,
}

impl BillingRepository {
    /// Creates a new BillingRepository issuing invoices in the default currency.
    pub fn new(pool: SqlitePool) -> Self {
        BillingRepository {
            pool,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    /// Sets the currency of new invoices.
    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }

    /// Pre-fills the billing form for a finished target.
    pub async fn start_billing(&self, target: &TargetRef) -> DbResult<BillingDraft> {
        let mut conn = self.pool.acquire().await?;

        let loaded = load_target(&mut conn, target).await?;
        check_billable(loaded.as_ref())?;

        let status = latest_balance(&mut conn, target.kind, &target.id)
            .await?
            .map(|balance| balance.payment_state);
        let already_paid = paid_for_target(&mut conn, target).await?;

        Ok(billing_draft(loaded.as_ref(), status, already_paid))
    }

    pub async fn confirm(&self, decision: &BillingDecision) -> DbResult<BillingOutcome> {
        self.confirm_at(decision, Utc::now()).await
    }

    /// Applies a billing decision atomically.
    ///
    /// ## Errors
    /// - `InvalidTransition` when the target is not finished
    /// - `AlreadyInvoiced` / `AlreadyPaid` / `InvalidPaymentAmount` from the plan
    /// - `InvoicePosting` for a target without lines
    /// - `MissingConfiguration` without cash journal, payment method or
    ///   time product
    pub async fn confirm_at(
        &self,
        decision: &BillingDecision,
        now: DateTime<Utc>,
    ) -> DbResult<BillingOutcome> {
        let target = &decision.target;
        let mut tx = self.pool.begin().await?;

        lock_target(&mut tx, target, now).await?;
        let loaded = load_target(&mut tx, target).await?;
        check_billable(loaded.as_ref())?;

        let existing = latest_balance(&mut tx, target.kind, &target.id).await?;
        let plan = plan_billing(decision, loaded.reference(), loaded.total(), existing.as_ref())?;

        debug!(
            target_id = %target.id,
            payment_way = ?decision.payment_way,
            plan = ?plan,
            "Billing plan"
        );

        let (invoice, created_invoice) = match plan.invoice {
            InvoiceStep::Create => {
                let time_product = time_product(&mut tx).await?;
                let draft = build_invoice(loaded.as_ref(), &time_product, &self.currency);
                (insert_posted_invoice(&mut tx, &draft, now).await?, true)
            }
            InvoiceStep::Reuse { invoice_id } => (get_invoice(&mut tx, &invoice_id).await?, false),
        };

        let paid_before = paid_amount(&mut tx, &invoice.id).await?;
        let amount = match plan.payment {
            PaymentStep::None => None,
            PaymentStep::Residual => Some(invoice.amount_total() - paid_before),
            PaymentStep::Amount(amount) => Some(amount),
        };

        let payment = match amount {
            Some(amount) if amount.is_positive() => {
                Some(insert_payment(&mut tx, &invoice, amount, now.date_naive(), now).await?)
            }
            _ => None,
        };

        let paid = paid_before + payment.as_ref().map(Payment::amount).unwrap_or_default();
        let lines = invoice_lines(&mut tx, &invoice.id).await?;
        let balance = InvoiceBalance::new(invoice, paid);

        tx.commit().await?;

        info!(
            target_id = %target.id,
            reference = %balance.invoice.reference,
            invoice = %balance.invoice.number,
            payment_state = ?balance.payment_state,
            paid_cents = balance.paid_cents,
            "Billing confirmed"
        );
        info!(
            target: "audit",
            action = "billing.confirm",
            target_kind = ?target.kind,
            target_id = %target.id,
            invoice = %balance.invoice.number,
            payment_cents = payment.as_ref().map(|p| p.amount_cents).unwrap_or(0)
        );

        Ok(BillingOutcome {
            invoice: balance,
            lines,
            payment,
            created_invoice,
        })
    }

    /// Invoices of a target with their balances, newest first.
    pub async fn invoices_for(&self, target: &TargetRef) -> DbResult<Vec<InvoiceBalance>> {
        let mut conn = self.pool.acquire().await?;
        let invoices = invoices_for(&mut conn, target.kind, &target.id).await?;

        let mut balances = Vec::with_capacity(invoices.len());
        for invoice in invoices {
            let paid = paid_amount(&mut conn, &invoice.id).await?;
            balances.push(InvoiceBalance::new(invoice, paid));
        }
        Ok(balances)
    }

    pub async fn invoice_lines(&self, invoice_id: &str) -> DbResult<Vec<InvoiceLine>> {
        let mut conn = self.pool.acquire().await?;
        get_invoice(&mut conn, invoice_id).await?;
        invoice_lines(&mut conn, invoice_id).await
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn load_target(conn: &mut SqliteConnection, target: &TargetRef) -> DbResult<Target> {
    match target.kind {
        TargetKind::Session => {
            let session = fetch_session(conn, &target.id).await?;
            Ok(Box::new(load_session_detail(conn, session).await?))
        }
        TargetKind::CafeOrder => {
            let order = fetch_order(conn, &target.id).await?;
            Ok(Box::new(load_cafe_detail(conn, order).await?))
        }
    }
}

/// Takes the write lock through a no-op update of the target row, so two
/// confirmations of the same target run one after the other.
async fn lock_target(conn: &mut SqliteConnection, target: &TargetRef, now: DateTime<Utc>) -> DbResult<()> {
    let sql = match target.kind {
        TargetKind::Session => "UPDATE sessions SET updated_at = ?2 WHERE id = ?1",
        TargetKind::CafeOrder => "UPDATE cafe_orders SET updated_at = ?2 WHERE id = ?1",
    };
    let result = sqlx::query(sql)
        .bind(&target.id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        warn!(target_id = %target.id, "Billing target not found");
        return Err(DbError::not_found(target.kind.entity_name(), &target.id));
    }
    Ok(())
}

/// Sum of payments on every invoice of the target.
async fn paid_for_target(conn: &mut SqliteConnection, target: &TargetRef) -> DbResult<Money> {
    let cents: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(p.amount_cents), 0)
        FROM payments p
        INNER JOIN invoices i ON i.id = p.invoice_id
        WHERE i.target_kind = ?1 AND i.target_id = ?2
        "#,
    )
    .bind(target.kind)
    .bind(&target.id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(Money::from_cents(cents))
}

// =============================================================================
// Unit Tests
// =============================================================================
