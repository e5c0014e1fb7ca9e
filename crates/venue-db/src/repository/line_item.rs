//! # Line Items
//!
//! Lines shared by sessions and café orders, keyed by `(owner_kind, owner_id)`.
//! Owners call these inside their own transactions after checking that the
//! owner still accepts line changes.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;
use venue_core::{CoreError, LineItem, NewLineItem, Product, TargetKind};

use crate::error::{DbError, DbResult};

const LINE_COLUMNS: &str = "id, owner_kind, owner_id, product_id, name_snapshot, quantity, \
                            unit_price_cents, discount_bps, created_at";

/// Lines of one owner, oldest first.
pub async fn lines_for(
    conn: &mut SqliteConnection,
    owner_kind: TargetKind,
    owner_id: &str,
) -> DbResult<Vec<LineItem>> {
    let sql = format!(
        "SELECT {} FROM line_items WHERE owner_kind = ?1 AND owner_id = ?2 ORDER BY created_at, id",
        LINE_COLUMNS
    );
    let lines = sqlx::query_as::<_, LineItem>(&sql)
        .bind(owner_kind)
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(lines)
}

/// Loads an active product for a new line.
pub async fn product_for_line(conn: &mut SqliteConnection, product_id: &str) -> DbResult<Product> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, sku, name, list_price_cents, is_active, created_at, updated_at
        FROM products
        WHERE id = ?1 AND is_active = 1
        "#,
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    product.ok_or_else(|| CoreError::not_found("Product", product_id).into())
}

/// Inserts a line.
///
/// ## Snapshot Pattern
/// The product name is copied so history survives catalog edits. The unit
/// price defaults to the product's list price.
pub async fn insert_line(
    conn: &mut SqliteConnection,
    owner_kind: TargetKind,
    owner_id: &str,
    product: &Product,
    input: &NewLineItem,
    now: DateTime<Utc>,
) -> DbResult<LineItem> {
    let line = LineItem {
        id: Uuid::new_v4().to_string(),
        owner_kind,
        owner_id: owner_id.to_string(),
        product_id: product.id.clone(),
        name_snapshot: product.name.clone(),
        quantity: input.quantity,
        unit_price_cents: input.unit_price_cents.unwrap_or(product.list_price_cents),
        discount_bps: input.discount_bps.unwrap_or(0),
        created_at: now,
    };

    debug!(
        owner_id = %owner_id,
        product_id = %line.product_id,
        quantity = line.quantity,
        "Adding line item"
    );

    sqlx::query(
        r#"
        INSERT INTO line_items (
            id, owner_kind, owner_id, product_id, name_snapshot,
            quantity, unit_price_cents, discount_bps, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&line.id)
    .bind(line.owner_kind)
    .bind(&line.owner_id)
    .bind(&line.product_id)
    .bind(&line.name_snapshot)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .bind(line.discount_bps)
    .bind(line.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(line)
}

/// Removes one line of an owner.
pub async fn delete_line(
    conn: &mut SqliteConnection,
    owner_kind: TargetKind,
    owner_id: &str,
    line_id: &str,
) -> DbResult<()> {
    let result = sqlx::query(
        "DELETE FROM line_items WHERE id = ?1 AND owner_kind = ?2 AND owner_id = ?3",
    )
    .bind(line_id)
    .bind(owner_kind)
    .bind(owner_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Line item", line_id));
    }

    debug!(owner_id = %owner_id, line_id = %line_id, "Removed line item");
    Ok(())
}

/// Removes every line of an owner.
pub async fn delete_lines_for(
    conn: &mut SqliteConnection,
    owner_kind: TargetKind,
    owner_id: &str,
) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM line_items WHERE owner_kind = ?1 AND owner_id = ?2")
        .bind(owner_kind)
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
