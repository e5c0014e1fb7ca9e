//! # Billing Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /billing/start    {target}                    → BillingDraft     │
//! │        form opens pre-filled with what remains to pay                  │
//! │                                                                         │
//! │  POST /billing/confirm  {target, payment_way, paid_amount_cents}       │
//! │        fully_paid      invoice + payment of the residual               │
//! │        partially_paid  invoice on first use, payment of the amount     │
//! │        later_paid      invoice only                                    │
//! │        one transaction; any failure leaves nothing behind              │
//! │                                                                         │
//! │  GET  /billing/invoices?target_kind=&target_id=                        │
//! │  GET  /billing/invoices/{id}/lines                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;
use venue_core::billing::{BillingDecision, BillingDraft, InvoiceBalance};
use venue_core::{InvoiceLine, TargetKind, TargetRef};
use venue_db::BillingOutcome;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/billing/start", post(start))
        .route("/billing/confirm", post(confirm))
        .route("/billing/invoices", get(invoices))
        .route("/billing/invoices/{id}/lines", get(invoice_lines))
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub target: TargetRef,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceQuery {
    pub target_kind: TargetKind,
    pub target_id: String,
}

async fn start(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> ApiResult<Json<BillingDraft>> {
    Ok(Json(state.billing().start_billing(&request.target).await?))
}

async fn confirm(
    State(state): State<AppState>,
    Json(decision): Json<BillingDecision>,
) -> ApiResult<Json<BillingOutcome>> {
    let outcome = state.billing().confirm(&decision).await?;
    info!(
        target_id = %decision.target.id,
        invoice = %outcome.invoice.invoice.number,
        payment_state = ?outcome.invoice.payment_state,
        "Billing confirmed"
    );
    Ok(Json(outcome))
}

async fn invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceQuery>,
) -> ApiResult<Json<Vec<InvoiceBalance>>> {
    let target = TargetRef {
        kind: query.target_kind,
        id: query.target_id,
    };
    Ok(Json(state.billing().invoices_for(&target).await?))
}

async fn invoice_lines(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<InvoiceLine>>> {
    Ok(Json(state.billing().invoice_lines(&id).await?))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{call, seed, test_app};
    use axum::http::{Method, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::json;
    use venue_core::NewSession;
    use venue_core::SessionType;

    /// A finished private session worth 30.00 of time plus a 10.00 line.
    async fn finished_session(state: &crate::state::AppState) -> String {
        let seeded = seed(&state.db).await;
        let start = Utc::now() - Duration::minutes(90);
        let detail = state
            .db
            .sessions()
            .create_session_at(
                &NewSession {
                    customer: "Alice".to_string(),
                    session_type: SessionType::Private,
                    individual_type: None,
                    resource_id: seeded.room_id,
                },
                start,
            )
            .await
            .unwrap();
        let id = detail.session.id;
        state
            .db
            .sessions()
            .add_line(
                &id,
                &venue_core::NewLineItem {
                    product_id: seeded.snack_id,
                    quantity: 2,
                    unit_price_cents: None,
                    discount_bps: None,
                },
            )
            .await
            .unwrap();
        state
            .db
            .sessions()
            .finish_at(&id, start + Duration::minutes(90))
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn test_partial_then_full_payment() {
        let (app, state) = test_app().await;
        let id = finished_session(&state).await;
        let target = json!({ "kind": "session", "id": id });

        let (status, draft) =
            call(&app, Method::POST, "/billing/start", Some(json!({ "target": target }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(draft["total_cents"], 4000);
        assert_eq!(draft["paid_amount_cents"], 4000);

        let (status, outcome) = call(
            &app,
            Method::POST,
            "/billing/confirm",
            Some(json!({
                "target": target,
                "payment_way": "partially_paid",
                "paid_amount_cents": 1500,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["created_invoice"], true);
        assert_eq!(outcome["invoice"]["number"], "INV/00001");
        assert_eq!(outcome["invoice"]["currency"], "EGP");
        assert_eq!(outcome["invoice"]["payment_state"], "partial");
        let invoice_id = outcome["invoice"]["id"].as_str().unwrap().to_string();

        let (_, draft) =
            call(&app, Method::POST, "/billing/start", Some(json!({ "target": target }))).await;
        assert_eq!(draft["paid_amount_cents"], 2500);
        assert_eq!(draft["payment_way"], "partially_paid");

        let (status, outcome) = call(
            &app,
            Method::POST,
            "/billing/confirm",
            Some(json!({ "target": target, "payment_way": "fully_paid" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["created_invoice"], false);
        assert_eq!(outcome["payment"]["amount_cents"], 2500);
        assert_eq!(outcome["invoice"]["payment_state"], "paid");

        let (status, err) = call(
            &app,
            Method::POST,
            "/billing/confirm",
            Some(json!({ "target": target, "payment_way": "fully_paid" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "CONFLICT");

        let (_, invoices) = call(
            &app,
            Method::GET,
            &format!("/billing/invoices?target_kind=session&target_id={}", id),
            None,
        )
        .await;
        assert_eq!(invoices.as_array().unwrap().len(), 1);
        assert_eq!(invoices[0]["paid_cents"], 4000);

        let (_, lines) = call(
            &app,
            Method::GET,
            &format!("/billing/invoices/{}/lines", invoice_id),
            None,
        )
        .await;
        assert_eq!(lines.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_running_session_not_billable() {
        let (app, state) = test_app().await;
        let seeded = seed(&state.db).await;
        let detail = state
            .db
            .sessions()
            .create_session(&NewSession {
                customer: "Bob".to_string(),
                session_type: SessionType::Private,
                individual_type: None,
                resource_id: seeded.room_id,
            })
            .await
            .unwrap();

        let (status, err) = call(
            &app,
            Method::POST,
            "/billing/start",
            Some(json!({ "target": { "kind": "session", "id": detail.session.id } })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["code"], "BUSINESS_LOGIC");
    }
}
