//! # Café Order Repository
//!
//! Café tabs on café tables. Same shape as sessions without the time
//! charge: a table holds at most one open tab.
//!
//! ```text
//!   create ──► available ──start──► running ──finish──► finished
//!   delete: available only
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;
use venue_core::availability::ensure_bookable;
use venue_core::lifecycle::{check_deletable, check_lines_editable, check_transition, Transition};
use venue_core::validation::{validate_customer, validate_new_line};
use venue_core::{
    CafeOrder, CafeOrderDetail, CoreError, LineItem, NewCafeOrder, NewLineItem, RecordState,
    ResourceCategory, TargetKind,
};

use super::catalog::{active_holders, fetch_resource};
use super::invoice::payment_status;
use super::line_item::{delete_line, delete_lines_for, insert_line, lines_for, product_for_line};
use super::sequence::next_reference;
use crate::error::{DbError, DbResult};

const ENTITY: &str = "Cafe order";

const ORDER_COLUMNS: &str = "id, reference, customer, table_id, state, created_at, updated_at";

/// Repository for café orders and their lines.
#[derive(Debug, Clone)]
pub struct CafeOrderRepository {
    pool: SqlitePool,
}

impl CafeOrderRepository {
    /// Creates a new CafeOrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CafeOrderRepository { pool }
    }

    pub async fn create_order(&self, input: &NewCafeOrder) -> DbResult<CafeOrderDetail> {
        self.create_order_at(input, Utc::now()).await
    }

    /// Opens a tab on a free café table, state available.
    ///
    /// ## Errors
    /// - `ResourceOccupied` when the table has an open tab
    /// - `WrongResourceCategory` when the id is not a café table
    pub async fn create_order_at(
        &self,
        input: &NewCafeOrder,
        now: DateTime<Utc>,
    ) -> DbResult<CafeOrderDetail> {
        validate_customer(&input.customer)?;
        let category = ResourceCategory::CafeTable;

        let mut tx = self.pool.begin().await?;

        let reference = next_reference(&mut tx, category.sequence_code()).await?;
        let table = fetch_resource(&mut tx, &input.table_id).await?;
        let holders = active_holders(&mut tx, category).await?;
        ensure_bookable(category, &table, &holders)?;

        let order = CafeOrder {
            id: Uuid::new_v4().to_string(),
            reference,
            customer: input.customer.trim().to_string(),
            table_id: table.id.clone(),
            state: RecordState::Available,
            created_at: now,
            updated_at: now,
        };

        debug!(order_id = %order.id, reference = %order.reference, table_id = %order.table_id, "Inserting cafe order");

        sqlx::query(
            r#"
            INSERT INTO cafe_orders (id, reference, customer, table_id, state, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&order.id)
        .bind(&order.reference)
        .bind(&order.customer)
        .bind(&order.table_id)
        .bind(order.state)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            let err = DbError::from(e);
            if err.is_unique_violation_on(&["cafe_orders.table_id"]) {
                CoreError::ResourceOccupied {
                    category: category.to_string(),
                    resource_id: input.table_id.clone(),
                }
                .into()
            } else {
                err
            }
        })?;

        let detail = load_cafe_detail(&mut tx, order).await?;
        tx.commit().await?;

        info!(order_id = %detail.order.id, reference = %detail.order.reference, "Cafe order created");
        info!(
            target: "audit",
            action = "cafe_order.create",
            order_id = %detail.order.id,
            reference = %detail.order.reference,
            table_id = %detail.order.table_id
        );
        Ok(detail)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get(&self, id: &str) -> DbResult<CafeOrder> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    pub async fn get_detail(&self, id: &str) -> DbResult<CafeOrderDetail> {
        let mut conn = self.pool.acquire().await?;
        let order = fetch_order(&mut conn, id).await?;
        load_cafe_detail(&mut conn, order).await
    }

    /// Orders newest first, optionally in one state.
    pub async fn list(&self, state: Option<RecordState>) -> DbResult<Vec<CafeOrderDetail>> {
        let sql = format!(
            "SELECT {} FROM cafe_orders WHERE (?1 IS NULL OR state = ?1) ORDER BY created_at DESC, reference DESC",
            ORDER_COLUMNS
        );
        let mut conn = self.pool.acquire().await?;
        let orders = sqlx::query_as::<_, CafeOrder>(&sql)
            .bind(state)
            .fetch_all(&mut *conn)
            .await?;
        load_cafe_details(&mut conn, orders).await
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub async fn mark_running(&self, id: &str) -> DbResult<CafeOrderDetail> {
        self.transition(id, Transition::Start, "available", "running").await
    }

    pub async fn finish(&self, id: &str) -> DbResult<CafeOrderDetail> {
        self.transition(id, Transition::Finish, "running", "finished").await
    }

    async fn transition(
        &self,
        id: &str,
        transition: Transition,
        from: &str,
        to: &str,
    ) -> DbResult<CafeOrderDetail> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE cafe_orders SET state = ?3, updated_at = ?4 WHERE id = ?1 AND state = ?2",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let order = fetch_order(&mut tx, id).await?;
            check_transition(ENTITY, &order.reference, order.state, transition)?;
            return Err(CoreError::invalid_transition(ENTITY, id, order.state, to).into());
        }

        let order = fetch_order(&mut tx, id).await?;
        let detail = load_cafe_detail(&mut tx, order).await?;
        tx.commit().await?;

        info!(order_id = %id, reference = %detail.order.reference, state = %to, "Cafe order state changed");
        info!(target: "audit", action = "cafe_order.transition", order_id = %id, state = %to);
        Ok(detail)
    }

    /// Deletes an available order and its lines.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM cafe_orders WHERE id = ?1 AND state = 'available'")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            let order = fetch_order(&mut tx, id).await?;
            check_deletable(ENTITY, &order.reference, order.state)?;
            return Err(DbError::not_found(ENTITY, id));
        }

        let lines = delete_lines_for(&mut tx, TargetKind::CafeOrder, id).await?;
        tx.commit().await?;

        info!(order_id = %id, lines, "Cafe order deleted");
        info!(target: "audit", action = "cafe_order.delete", order_id = %id);
        Ok(())
    }

    // =========================================================================
    // Lines
    // =========================================================================

    pub async fn add_line(&self, order_id: &str, input: &NewLineItem) -> DbResult<LineItem> {
        validate_new_line(input)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        touch_editable(&mut tx, order_id, now).await?;

        let product = product_for_line(&mut tx, &input.product_id).await?;
        let line = insert_line(&mut tx, TargetKind::CafeOrder, order_id, &product, input, now).await?;
        tx.commit().await?;

        info!(target: "audit", action = "cafe_order.add_line", order_id = %order_id, line_id = %line.id);
        Ok(line)
    }

    pub async fn remove_line(&self, order_id: &str, line_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        touch_editable(&mut tx, order_id, Utc::now()).await?;

        delete_line(&mut tx, TargetKind::CafeOrder, order_id, line_id).await?;
        tx.commit().await?;

        info!(target: "audit", action = "cafe_order.remove_line", order_id = %order_id, line_id = %line_id);
        Ok(())
    }
}

// =============================================================================
// Connection-level helpers
// =============================================================================

async fn touch_editable(conn: &mut SqliteConnection, id: &str, now: DateTime<Utc>) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE cafe_orders SET updated_at = ?2 WHERE id = ?1 AND state <> 'finished'",
    )
    .bind(id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let order = fetch_order(conn, id).await?;
        check_lines_editable(ENTITY, &order.reference, order.state)?;
    }
    Ok(())
}

pub async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<CafeOrder> {
    let sql = format!("SELECT {} FROM cafe_orders WHERE id = ?1", ORDER_COLUMNS);
    sqlx::query_as::<_, CafeOrder>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found(ENTITY, id))
}

/// Attaches lines, the table's display name and payment status.
pub async fn load_cafe_detail(conn: &mut SqliteConnection, order: CafeOrder) -> DbResult<CafeOrderDetail> {
    let lines = lines_for(conn, TargetKind::CafeOrder, &order.id).await?;

    let label: Option<String> = sqlx::query_scalar("SELECT label FROM resources WHERE id = ?1")
        .bind(&order.table_id)
        .fetch_optional(&mut *conn)
        .await?;
    let table_label = ResourceCategory::CafeTable.location_name(label.as_deref().unwrap_or("?"));

    let status = payment_status(conn, TargetKind::CafeOrder, &order.id).await?;
    Ok(CafeOrderDetail::new(order, lines, table_label, status))
}

async fn load_cafe_details(
    conn: &mut SqliteConnection,
    orders: Vec<CafeOrder>,
) -> DbResult<Vec<CafeOrderDetail>> {
    let mut details = Vec::with_capacity(orders.len());
    for order in orders {
        details.push(load_cafe_detail(conn, order).await?);
    }
    Ok(details)
}

/// Orders created in `[start, end)`, newest first, at most `limit`.
/// A missing bound is open.
pub async fn created_between(
    conn: &mut SqliteConnection,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    limit: Option<i64>,
) -> DbResult<Vec<CafeOrderDetail>> {
    let sql = format!(
        r#"
        SELECT {} FROM cafe_orders
        WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at < ?2)
        ORDER BY created_at DESC, reference DESC
        LIMIT ?3
        "#,
        ORDER_COLUMNS
    );
    let orders = sqlx::query_as::<_, CafeOrder>(&sql)
        .bind(start)
        .bind(end)
        .bind(limit.unwrap_or(-1))
        .fetch_all(&mut *conn)
        .await?;
    load_cafe_details(conn, orders).await
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{seed_catalog, test_db};

    #[tokio::test]
    async fn test_lifecycle_and_total() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let repo = db.cafe_orders();

        let order = repo.create_order(&catalog.cafe_order("Alice")).await.unwrap();
        assert_eq!(order.order.reference, "CAFE/00001");
        assert_eq!(order.order.state, RecordState::Available);
        assert_eq!(order.table_label, "Table 1");

        let id = order.order.id.clone();
        repo.add_line(
            &id,
            &NewLineItem {
                product_id: catalog.snack.id.clone(),
                quantity: 2,
                unit_price_cents: Some(1000),
                discount_bps: None,
            },
        )
        .await
        .unwrap();
        repo.add_line(
            &id,
            &NewLineItem {
                product_id: catalog.snack.id.clone(),
                quantity: 1,
                unit_price_cents: Some(500),
                discount_bps: Some(2000),
            },
        )
        .await
        .unwrap();

        // Finishing straight from available is not allowed
        let err = repo.finish(&id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidTransition { .. })));

        repo.mark_running(&id).await.unwrap();
        let finished = repo.finish(&id).await.unwrap();
        assert_eq!(finished.order.state, RecordState::Finished);
        assert_eq!(finished.total_cents, 2400);
    }

    #[tokio::test]
    async fn test_table_holds_one_open_tab() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let repo = db.cafe_orders();

        let first = repo.create_order(&catalog.cafe_order("Alice")).await.unwrap();
        let err = repo.create_order(&catalog.cafe_order("Bob")).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ResourceOccupied { .. })));

        // A room id is not a café table
        let err = repo
            .create_order(&NewCafeOrder {
                customer: "Bob".to_string(),
                table_id: catalog.room.id.clone(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::WrongResourceCategory { .. })));

        repo.delete(&first.order.id).await.unwrap();
        let second = repo.create_order(&catalog.cafe_order("Bob")).await.unwrap();
        assert_eq!(second.order.reference, "CAFE/00002");
    }

    #[tokio::test]
    async fn test_delete_only_when_available() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let repo = db.cafe_orders();

        let order = repo.create_order(&catalog.cafe_order("Alice")).await.unwrap();
        repo.mark_running(&order.order.id).await.unwrap();

        let err = repo.delete(&order.order.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotDeletable { .. })));

        let err = repo.delete("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
