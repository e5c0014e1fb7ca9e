//! # Reference Sequences
//!
//! Named monotonic counters backing reference codes (`ROOM/00042`) and
//! invoice numbers (`INV/00007`).
//!
//! ```text
//!   sequences
//!   ┌─────────────────┬────────┬─────────────┬─────────┐
//!   │ code            │ prefix │ next_number │ padding │
//!   ├─────────────────┼────────┼─────────────┼─────────┤
//!   │ session.private │ ROOM/  │ 43          │ 5       │ ──► ROOM/00042
//!   │ cafe.order      │ CAFE/  │ 8           │ 5       │
//!   └─────────────────┴────────┴─────────────┴─────────┘
//! ```
//!
//! The counter is bumped inside the caller's transaction, so a rolled-back
//! creation does not consume a number. Being the first write of the
//! transaction, it also takes SQLite's write lock before any availability
//! read, which serializes concurrent creations.

use sqlx::SqliteConnection;
use tracing::debug;
use venue_core::CoreError;

use crate::error::DbResult;

/// Sequence code for invoice numbers.
pub const INVOICE_SEQUENCE: &str = "invoice";

/// Allocates the next code from sequence `code`.
///
/// ## Errors
/// `MissingConfiguration` when no such sequence exists.
pub async fn next_reference(conn: &mut SqliteConnection, code: &str) -> DbResult<String> {
    let row: Option<(String, i64, i64)> = sqlx::query_as(
        r#"
        UPDATE sequences
        SET next_number = next_number + 1
        WHERE code = ?1
        RETURNING prefix, next_number - 1, padding
        "#,
    )
    .bind(code)
    .fetch_optional(&mut *conn)
    .await?;

    let (prefix, number, padding) = row.ok_or_else(|| {
        CoreError::MissingConfiguration(format!("reference sequence '{}'", code))
    })?;

    let reference = format!("{}{:0width$}", prefix, number, width = padding.max(0) as usize);
    debug!(code = %code, reference = %reference, "Allocated reference");
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::test_db;

    #[tokio::test]
    async fn test_references_are_strictly_increasing_per_sequence() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let a = next_reference(&mut conn, "session.private").await.unwrap();
        let b = next_reference(&mut conn, "session.private").await.unwrap();
        let c = next_reference(&mut conn, "session.console").await.unwrap();

        assert_eq!(a, "ROOM/00001");
        assert_eq!(b, "ROOM/00002");
        assert!(b > a);
        // Independent counter
        assert_eq!(c, "CONS/00001");
    }

    #[tokio::test]
    async fn test_missing_sequence_is_a_configuration_error() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let err = next_reference(&mut conn, "nope").await.unwrap_err();
        assert!(matches!(
            err,
            crate::DbError::Domain(CoreError::MissingConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_rolled_back_allocation_is_not_consumed() {
        let db = test_db().await;

        {
            let mut tx = db.pool().begin().await.unwrap();
            next_reference(&mut tx, "cafe.order").await.unwrap();
            tx.rollback().await.unwrap();
        }

        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(
            next_reference(&mut conn, "cafe.order").await.unwrap(),
            "CAFE/00001"
        );
    }
}
