//! # Billing Workflow (decision logic)
//!
//! Everything the billing workflow decides without touching storage:
//! what a billable record looks like, which invoice lines it produces,
//! what the billing form is pre-filled with, and which steps a confirmed
//! decision turns into.
//!
//! ## Confirm Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BillingDecision { target, payment_way, paid_amount }                   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  plan_billing(decision, existing posted invoice?)  ← THIS MODULE       │
//! │        │                                                                │
//! │        ├── fully_paid     → Create (or Reuse)  + pay residual           │
//! │        ├── partially_paid → Reuse if found, else Create + pay amount    │
//! │        └── later_paid     → Create             + no payment             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  venue-db executes the plan in ONE transaction                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::detail::{CafeOrderDetail, SessionDetail};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::lines_total;
use crate::types::{
    DiscountRate, Invoice, LineItem, PaymentState, PaymentWay, Product, RecordState, TargetKind,
};

// =============================================================================
// Billing Target
// =============================================================================

/// Identifies a session or café order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TargetRef {
    pub kind: TargetKind,
    pub id: String,
}

impl TargetRef {
    pub fn session(id: impl Into<String>) -> Self {
        TargetRef {
            kind: TargetKind::Session,
            id: id.into(),
        }
    }

    pub fn cafe_order(id: impl Into<String>) -> Self {
        TargetRef {
            kind: TargetKind::CafeOrder,
            id: id.into(),
        }
    }
}

/// The capability the billing workflow needs from a billable record.
///
/// Implemented by [`SessionDetail`] and [`CafeOrderDetail`]; the workflow
/// never branches on which one it holds.
pub trait BillingTarget {
    fn target(&self) -> TargetRef;
    fn customer(&self) -> &str;
    fn reference(&self) -> &str;
    fn lines(&self) -> &[LineItem];
    fn created_at(&self) -> DateTime<Utc>;
    fn state(&self) -> RecordState;

    /// Synthetic time charge; only sessions have one.
    fn time_charge(&self) -> Option<Money> {
        None
    }

    fn total(&self) -> Money {
        lines_total(self.lines()) + self.time_charge().unwrap_or_default()
    }
}

impl BillingTarget for SessionDetail {
    fn target(&self) -> TargetRef {
        TargetRef::session(self.session.id.clone())
    }

    fn customer(&self) -> &str {
        &self.session.customer
    }

    fn reference(&self) -> &str {
        &self.session.reference
    }

    fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.session.created_at
    }

    fn state(&self) -> RecordState {
        self.session.state
    }

    fn time_charge(&self) -> Option<Money> {
        Some(self.time_price())
    }
}

impl BillingTarget for CafeOrderDetail {
    fn target(&self) -> TargetRef {
        TargetRef::cafe_order(self.order.id.clone())
    }

    fn customer(&self) -> &str {
        &self.order.customer
    }

    fn reference(&self) -> &str {
        &self.order.reference
    }

    fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.order.created_at
    }

    fn state(&self) -> RecordState {
        self.order.state
    }
}

/// Only finished records are billed.
pub fn check_billable(target: &dyn BillingTarget) -> CoreResult<()> {
    if target.state() != RecordState::Finished {
        let target_ref = target.target();
        return Err(CoreError::invalid_transition(
            target_ref.kind.entity_name(),
            target.reference(),
            target.state(),
            "bill",
        ));
    }
    Ok(())
}

// =============================================================================
// Invoice Construction
// =============================================================================

/// An invoice line before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLineDraft {
    pub product_id: String,
    pub label: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: DiscountRate,
}

impl InvoiceLineDraft {
    pub fn subtotal(&self) -> Money {
        self.unit_price
            .multiply_quantity(self.quantity)
            .apply_discount(self.discount)
    }
}

/// An invoice before it is stored.
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub target: TargetRef,
    pub customer: String,
    pub reference: String,
    pub invoice_date: NaiveDate,
    pub currency: String,
    pub lines: Vec<InvoiceLineDraft>,
}

impl InvoiceDraft {
    pub fn amount_total(&self) -> Money {
        self.lines.iter().map(InvoiceLineDraft::subtotal).sum()
    }
}

/// Builds the invoice for `target`.
///
/// One line per record line; sessions get one extra line for the time
/// product (quantity 1, priced at the session's time price). The invoice
/// is dated on the record's creation day.
pub fn build_invoice(
    target: &dyn BillingTarget,
    time_product: &Product,
    currency: &str,
) -> InvoiceDraft {
    let mut lines: Vec<InvoiceLineDraft> = target
        .lines()
        .iter()
        .map(|line| InvoiceLineDraft {
            product_id: line.product_id.clone(),
            label: line.name_snapshot.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price(),
            discount: line.discount(),
        })
        .collect();

    if let Some(time_price) = target.time_charge() {
        lines.push(InvoiceLineDraft {
            product_id: time_product.id.clone(),
            label: time_product.name.clone(),
            quantity: 1,
            unit_price: time_price,
            discount: DiscountRate::zero(),
        });
    }

    InvoiceDraft {
        target: target.target(),
        customer: target.customer().to_string(),
        reference: target.reference().to_string(),
        invoice_date: target.created_at().date_naive(),
        currency: currency.to_string(),
        lines,
    }
}

/// Posting requires at least one line.
pub fn check_postable(draft: &InvoiceDraft) -> CoreResult<()> {
    if draft.lines.is_empty() {
        return Err(CoreError::InvoicePosting {
            reason: format!("{} has no lines", draft.reference),
        });
    }
    Ok(())
}

// =============================================================================
// Invoice Balance
// =============================================================================

/// A posted invoice with the sum of its payments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceBalance {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub paid_cents: i64,
    pub payment_state: PaymentState,
}

impl InvoiceBalance {
    pub fn new(invoice: Invoice, paid: Money) -> Self {
        let payment_state = PaymentState::from_amounts(invoice.amount_total(), paid);
        InvoiceBalance {
            invoice,
            paid_cents: paid.cents(),
            payment_state,
        }
    }

    #[inline]
    pub fn paid(&self) -> Money {
        Money::from_cents(self.paid_cents)
    }

    /// What is still open on the invoice.
    pub fn residual(&self) -> Money {
        let open = self.invoice.amount_total() - self.paid();
        if open.is_negative() {
            Money::zero()
        } else {
            open
        }
    }
}

// =============================================================================
// Billing Form
// =============================================================================

/// The confirmed choice of the billing form. Never stored.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillingDecision {
    pub target: TargetRef,
    pub payment_way: PaymentWay,
    /// Amount for `partially_paid`; ignored otherwise.
    #[serde(default)]
    pub paid_amount_cents: i64,
}

/// What the billing form opens with.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillingDraft {
    pub target: TargetRef,
    pub reference: String,
    pub customer: String,
    pub total_cents: i64,
    pub already_paid_cents: i64,
    pub payment_status: Option<PaymentState>,
    /// Pre-selected when the record is already partially paid.
    pub payment_way: Option<PaymentWay>,
    /// Suggested amount: total minus what was already paid.
    pub paid_amount_cents: i64,
}

/// Pre-fills the billing form for `target`.
pub fn billing_draft(
    target: &dyn BillingTarget,
    payment_status: Option<PaymentState>,
    already_paid: Money,
) -> BillingDraft {
    let total = target.total();
    let open = total - already_paid;

    BillingDraft {
        target: target.target(),
        reference: target.reference().to_string(),
        customer: target.customer().to_string(),
        total_cents: total.cents(),
        already_paid_cents: already_paid.cents(),
        payment_status,
        payment_way: match payment_status {
            Some(PaymentState::Partial) => Some(PaymentWay::PartiallyPaid),
            _ => None,
        },
        paid_amount_cents: open.cents().max(0),
    }
}

// =============================================================================
// Billing Plan
// =============================================================================

/// Invoice step of a billing plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceStep {
    /// Create and post a new invoice.
    Create,
    /// Pay against an existing posted invoice.
    Reuse { invoice_id: String },
}

/// Payment step of a billing plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStep {
    None,
    /// Pay whatever is open on the invoice once created or found.
    Residual,
    Amount(Money),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingPlan {
    pub invoice: InvoiceStep,
    pub payment: PaymentStep,
}

/// Turns a decision into steps.
///
/// `existing` is the target's most recent posted invoice, if any.
/// At most one posted invoice exists per target, so `later_paid` on an
/// invoiced target and any payment on a settled one are rejected.
pub fn plan_billing(
    decision: &BillingDecision,
    reference: &str,
    target_total: Money,
    existing: Option<&InvoiceBalance>,
) -> CoreResult<BillingPlan> {
    let already_paid = || CoreError::AlreadyPaid {
        reference: reference.to_string(),
    };

    match decision.payment_way {
        PaymentWay::FullyPaid => match existing {
            Some(balance) if balance.residual().is_zero() => Err(already_paid()),
            Some(balance) => Ok(BillingPlan {
                invoice: InvoiceStep::Reuse {
                    invoice_id: balance.invoice.id.clone(),
                },
                payment: PaymentStep::Residual,
            }),
            None => Ok(BillingPlan {
                invoice: InvoiceStep::Create,
                payment: if target_total.is_positive() {
                    PaymentStep::Residual
                } else {
                    PaymentStep::None
                },
            }),
        },

        PaymentWay::PartiallyPaid => {
            let amount = Money::from_cents(decision.paid_amount_cents);
            if !amount.is_positive() {
                return Err(CoreError::InvalidPaymentAmount {
                    reason: "paid amount must be positive".to_string(),
                });
            }

            let (invoice, open) = match existing {
                Some(balance) => (
                    InvoiceStep::Reuse {
                        invoice_id: balance.invoice.id.clone(),
                    },
                    balance.residual(),
                ),
                None => (InvoiceStep::Create, target_total),
            };

            if open.is_zero() {
                return Err(already_paid());
            }
            if amount > open {
                return Err(CoreError::InvalidPaymentAmount {
                    reason: format!("{} exceeds the open amount {}", amount, open),
                });
            }

            Ok(BillingPlan {
                invoice,
                payment: PaymentStep::Amount(amount),
            })
        }

        PaymentWay::LaterPaid => match existing {
            Some(balance) => Err(CoreError::AlreadyInvoiced {
                reference: reference.to_string(),
                invoice_number: balance.invoice.number.clone(),
            }),
            None => Ok(BillingPlan {
                invoice: InvoiceStep::Create,
                payment: PaymentStep::None,
            }),
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
