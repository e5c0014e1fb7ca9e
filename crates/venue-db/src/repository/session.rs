//! # Session Repository
//!
//! Reservations of rooms, consoles and tables.
//!
//! ## Creation Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. next_reference(category.sequence_code())  ← first write: takes     │
//! │                                                   the write lock        │
//! │   2. load resource                                                     │
//! │   3. active_holders(category) → ensure_bookable                        │
//! │   4. INSERT session                                                    │
//! │        idx_sessions_active_resource (partial UNIQUE over active rows)  │
//! │        rejects a second active holder → ResourceOccupied               │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//! ```text
//!   create ──► running ──finish──► finished
//!   reserve ─► available ─start / sweep─► running
//!   delete: available only
//! ```
//!
//! State changes are conditional UPDATEs; when nothing matches, the row is
//! read back to report why.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;
use venue_core::availability::ensure_bookable;
use venue_core::lifecycle::{
    check_deletable, check_finish_time, check_lines_editable, check_reservation_time,
    check_transition, Transition,
};
use venue_core::validation::{validate_customer, validate_new_line};
use venue_core::{
    CoreError, LineItem, NewLineItem, NewSession, RecordState, ResourceCategory, Session,
    SessionDetail, TargetKind,
};

use super::catalog::{active_holders, fetch_resource, resource_info};
use super::invoice::payment_status;
use super::line_item::{delete_line, delete_lines_for, insert_line, lines_for, product_for_line};
use super::sequence::next_reference;
use crate::error::{DbError, DbResult};

const ENTITY: &str = "Session";

const SESSION_COLUMNS: &str = "id, reference, customer, session_type, individual_type, category, \
                               resource_id, starting_time, ending_time, state, created_at, updated_at";

/// Repository for sessions and their lines.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Starts a session now on a free resource.
    pub async fn create_session(&self, input: &NewSession) -> DbResult<SessionDetail> {
        self.create_session_at(input, Utc::now()).await
    }

    /// Starts a session at `now`: state running, starting time `now`.
    ///
    /// ## Errors
    /// - validation errors for an empty customer or a type mismatch
    /// - `WrongResourceCategory` when the resource is of another category
    /// - `ResourceOccupied` when an active record holds the resource
    pub async fn create_session_at(
        &self,
        input: &NewSession,
        now: DateTime<Utc>,
    ) -> DbResult<SessionDetail> {
        self.insert_session(input, now, RecordState::Running, now).await
    }

    /// Reserves a resource from a future starting time.
    pub async fn reserve_session(
        &self,
        input: &NewSession,
        starting_time: DateTime<Utc>,
    ) -> DbResult<SessionDetail> {
        self.reserve_session_at(input, starting_time, Utc::now()).await
    }

    /// Reserves a resource: state available, holding the resource until
    /// the sweeper or an explicit start makes it running.
    pub async fn reserve_session_at(
        &self,
        input: &NewSession,
        starting_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DbResult<SessionDetail> {
        check_reservation_time(starting_time, now)?;
        self.insert_session(input, starting_time, RecordState::Available, now).await
    }

    async fn insert_session(
        &self,
        input: &NewSession,
        starting_time: DateTime<Utc>,
        state: RecordState,
        now: DateTime<Utc>,
    ) -> DbResult<SessionDetail> {
        validate_customer(&input.customer)?;
        let category = ResourceCategory::for_session(input.session_type, input.individual_type)?;

        let mut tx = self.pool.begin().await?;

        let reference = next_reference(&mut tx, category.sequence_code()).await?;
        let resource = fetch_resource(&mut tx, &input.resource_id).await?;
        let holders = active_holders(&mut tx, category).await?;
        ensure_bookable(category, &resource, &holders)?;

        let session = Session {
            id: Uuid::new_v4().to_string(),
            reference,
            customer: input.customer.trim().to_string(),
            session_type: input.session_type,
            individual_type: input.individual_type,
            category,
            resource_id: resource.id.clone(),
            starting_time,
            ending_time: None,
            state,
            created_at: now,
            updated_at: now,
        };

        debug!(
            session_id = %session.id,
            reference = %session.reference,
            resource_id = %session.resource_id,
            "Inserting session"
        );

        sqlx::query(
            r#"
            INSERT INTO sessions (
                id, reference, customer, session_type, individual_type, category,
                resource_id, starting_time, ending_time, state, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&session.id)
        .bind(&session.reference)
        .bind(&session.customer)
        .bind(session.session_type)
        .bind(session.individual_type)
        .bind(session.category)
        .bind(&session.resource_id)
        .bind(session.starting_time)
        .bind(session.ending_time)
        .bind(session.state)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| occupied_on_conflict(e, category, &input.resource_id))?;

        let detail = load_session_detail(&mut tx, session).await?;
        tx.commit().await?;

        info!(
            session_id = %detail.session.id,
            reference = %detail.session.reference,
            state = %detail.session.state,
            "Session created"
        );
        info!(
            target: "audit",
            action = "session.create",
            session_id = %detail.session.id,
            reference = %detail.session.reference,
            resource_id = %detail.session.resource_id
        );

        Ok(detail)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get(&self, id: &str) -> DbResult<Session> {
        let mut conn = self.pool.acquire().await?;
        fetch_session(&mut conn, id).await
    }

    /// A session with lines, prices and payment status.
    pub async fn get_detail(&self, id: &str) -> DbResult<SessionDetail> {
        let mut conn = self.pool.acquire().await?;
        let session = fetch_session(&mut conn, id).await?;
        load_session_detail(&mut conn, session).await
    }

    /// Sessions newest first, optionally in one state.
    pub async fn list(&self, state: Option<RecordState>) -> DbResult<Vec<SessionDetail>> {
        let sql = format!(
            "SELECT {} FROM sessions WHERE (?1 IS NULL OR state = ?1) ORDER BY starting_time DESC, reference DESC",
            SESSION_COLUMNS
        );
        let mut conn = self.pool.acquire().await?;
        let sessions = sqlx::query_as::<_, Session>(&sql)
            .bind(state)
            .fetch_all(&mut *conn)
            .await?;
        load_session_details(&mut conn, sessions).await
    }

    /// Sessions with `start <= starting_time < end`, newest first.
    pub async fn started_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<SessionDetail>> {
        let mut conn = self.pool.acquire().await?;
        started_between(&mut conn, Some(start), Some(end), None).await
    }

    /// Number of sessions currently running.
    pub async fn count_running(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE state = 'running'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Starts a reserved session now.
    pub async fn mark_running(&self, id: &str) -> DbResult<SessionDetail> {
        self.mark_running_at(id, Utc::now()).await
    }

    /// available → running. The reserved starting time is kept.
    pub async fn mark_running_at(&self, id: &str, now: DateTime<Utc>) -> DbResult<SessionDetail> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE sessions SET state = 'running', updated_at = ?2 WHERE id = ?1 AND state = 'available'",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let session = fetch_session(&mut tx, id).await?;
            check_transition(ENTITY, &session.reference, session.state, Transition::Start)?;
            return Err(CoreError::invalid_transition(ENTITY, id, session.state, "start").into());
        }

        let session = fetch_session(&mut tx, id).await?;
        let detail = load_session_detail(&mut tx, session).await?;
        tx.commit().await?;

        info!(session_id = %id, reference = %detail.session.reference, "Session started");
        info!(target: "audit", action = "session.start", session_id = %id);
        Ok(detail)
    }

    /// Finishes a running session now.
    pub async fn finish(&self, id: &str) -> DbResult<SessionDetail> {
        self.finish_at(id, Utc::now()).await
    }

    /// running → finished, stamping the ending time.
    ///
    /// ## Errors
    /// - `InvalidTransition` unless running
    /// - `InvalidTimeRange` when `now` is not after the starting time
    pub async fn finish_at(&self, id: &str, now: DateTime<Utc>) -> DbResult<SessionDetail> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET state = 'finished', ending_time = ?2, updated_at = ?2
            WHERE id = ?1 AND state = 'running' AND starting_time < ?2
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let session = fetch_session(&mut tx, id).await?;
            check_transition(ENTITY, &session.reference, session.state, Transition::Finish)?;
            check_finish_time(session.starting_time, now)?;
            return Err(CoreError::invalid_transition(ENTITY, id, session.state, "finish").into());
        }

        let session = fetch_session(&mut tx, id).await?;
        let detail = load_session_detail(&mut tx, session).await?;
        tx.commit().await?;

        info!(
            session_id = %id,
            reference = %detail.session.reference,
            spent_minutes = detail.spent_minutes,
            total_cents = detail.total_cents,
            "Session finished"
        );
        info!(target: "audit", action = "session.finish", session_id = %id);
        Ok(detail)
    }

    /// Deletes an available session and its lines.
    ///
    /// ## Errors
    /// `NotDeletable` once running or finished.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM sessions WHERE id = ?1 AND state = 'available'")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            let session = fetch_session(&mut tx, id).await?;
            check_deletable(ENTITY, &session.reference, session.state)?;
            return Err(DbError::not_found(ENTITY, id));
        }

        let lines = delete_lines_for(&mut tx, TargetKind::Session, id).await?;
        tx.commit().await?;

        info!(session_id = %id, lines, "Session deleted");
        info!(target: "audit", action = "session.delete", session_id = %id);
        Ok(())
    }

    /// Promotes every reservation whose starting time has come.
    ///
    /// Returns the number of sessions promoted.
    pub async fn promote_due_reservations(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET state = 'running', updated_at = ?1
            WHERE state = 'available' AND starting_time <= ?1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        let promoted = result.rows_affected();
        if promoted > 0 {
            info!(promoted, "Promoted due reservations");
            info!(target: "audit", action = "session.promote", promoted);
        }
        Ok(promoted)
    }

    // =========================================================================
    // Lines
    // =========================================================================

    /// Adds a product line while the session is not finished.
    pub async fn add_line(&self, session_id: &str, input: &NewLineItem) -> DbResult<LineItem> {
        validate_new_line(input)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        touch_editable(&mut tx, session_id, now).await?;

        let product = product_for_line(&mut tx, &input.product_id).await?;
        let line = insert_line(&mut tx, TargetKind::Session, session_id, &product, input, now).await?;
        tx.commit().await?;

        info!(target: "audit", action = "session.add_line", session_id = %session_id, line_id = %line.id);
        Ok(line)
    }

    /// Removes a line while the session is not finished.
    pub async fn remove_line(&self, session_id: &str, line_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        touch_editable(&mut tx, session_id, Utc::now()).await?;

        delete_line(&mut tx, TargetKind::Session, session_id, line_id).await?;
        tx.commit().await?;

        info!(target: "audit", action = "session.remove_line", session_id = %session_id, line_id = %line_id);
        Ok(())
    }
}

// =============================================================================
// Connection-level helpers
// =============================================================================

/// Maps a lost race on the partial unique index to `ResourceOccupied`.
fn occupied_on_conflict(err: sqlx::Error, category: ResourceCategory, resource_id: &str) -> DbError {
    let err = DbError::from(err);
    if err.is_unique_violation_on(&["sessions.resource_id"]) {
        return CoreError::ResourceOccupied {
            category: category.to_string(),
            resource_id: resource_id.to_string(),
        }
        .into();
    }
    err
}

/// Bumps `updated_at` if lines may still change; reports why otherwise.
async fn touch_editable(conn: &mut SqliteConnection, id: &str, now: DateTime<Utc>) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE sessions SET updated_at = ?2 WHERE id = ?1 AND state <> 'finished'",
    )
    .bind(id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let session = fetch_session(conn, id).await?;
        check_lines_editable(ENTITY, &session.reference, session.state)?;
    }
    Ok(())
}

pub async fn fetch_session(conn: &mut SqliteConnection, id: &str) -> DbResult<Session> {
    let sql = format!("SELECT {} FROM sessions WHERE id = ?1", SESSION_COLUMNS);
    sqlx::query_as::<_, Session>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found(ENTITY, id))
}

/// Attaches lines, resource pricing and payment status.
pub async fn load_session_detail(conn: &mut SqliteConnection, session: Session) -> DbResult<SessionDetail> {
    let lines = lines_for(conn, TargetKind::Session, &session.id).await?;
    let resource = resource_info(conn, session.category, &session.resource_id).await?;
    let status = payment_status(conn, TargetKind::Session, &session.id).await?;
    Ok(SessionDetail::new(session, lines, resource, status))
}

async fn load_session_details(
    conn: &mut SqliteConnection,
    sessions: Vec<Session>,
) -> DbResult<Vec<SessionDetail>> {
    let mut details = Vec::with_capacity(sessions.len());
    for session in sessions {
        details.push(load_session_detail(conn, session).await?);
    }
    Ok(details)
}

/// Sessions started in `[start, end)`, newest first, at most `limit`.
/// A missing bound is open.
pub async fn started_between(
    conn: &mut SqliteConnection,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    limit: Option<i64>,
) -> DbResult<Vec<SessionDetail>> {
    let sql = format!(
        r#"
        SELECT {} FROM sessions
        WHERE (?1 IS NULL OR starting_time >= ?1) AND (?2 IS NULL OR starting_time < ?2)
        ORDER BY starting_time DESC, reference DESC
        LIMIT ?3
        "#,
        SESSION_COLUMNS
    );
    let sessions = sqlx::query_as::<_, Session>(&sql)
        .bind(start)
        .bind(end)
        .bind(limit.unwrap_or(-1))
        .fetch_all(&mut *conn)
        .await?;
    load_session_details(conn, sessions).await
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{file_db, seed_catalog, test_db};
    use chrono::{Duration, TimeZone};
    use venue_core::{IndividualType, SessionType, ValidationError};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_create_allocates_reference_and_runs() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let repo = db.sessions();

        let first = repo
            .create_session_at(&catalog.private_session("Alice", &catalog.room.id), t0())
            .await
            .unwrap();
        let second = repo
            .create_session_at(&catalog.private_session("Bob", &catalog.room2.id), t0())
            .await
            .unwrap();
        let console = repo
            .create_session_at(&catalog.console_session("Carol"), t0())
            .await
            .unwrap();

        assert_eq!(first.session.reference, "ROOM/00001");
        assert_eq!(second.session.reference, "ROOM/00002");
        assert_eq!(console.session.reference, "CONS/00001");
        assert_eq!(first.session.state, RecordState::Running);
        assert_eq!(first.session.starting_time, t0());
        assert_eq!(console.location, "Console 1");
        assert_eq!(first.payment_status, None);
    }

    #[tokio::test]
    async fn test_occupied_resource_is_rejected() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let repo = db.sessions();

        let first = repo
            .create_session_at(&catalog.table_session("Alice"), t0())
            .await
            .unwrap();
        let err = repo
            .create_session_at(&catalog.table_session("Bob"), t0())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ResourceOccupied { .. })));
        assert_eq!(repo.list(None).await.unwrap().len(), 1);

        // The failed creation did not consume a reference
        repo.finish_at(&first.session.id, t0() + Duration::minutes(1))
            .await
            .unwrap();
        let next = repo
            .create_session_at(&catalog.table_session("Bob"), t0() + Duration::minutes(2))
            .await
            .unwrap();
        assert_eq!(next.session.reference, "TBL/00002");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creations_exactly_one_wins() {
        let (db, _dir) = file_db(8).await;
        let catalog = seed_catalog(&db).await;

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let db = db.clone();
                let input = catalog.console_session(&format!("Player {}", i));
                tokio::spawn(async move { db.sessions().create_session(&input).await })
            })
            .collect();

        let mut wins = 0;
        let mut occupied = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => wins += 1,
                Err(DbError::Domain(CoreError::ResourceOccupied { .. })) => occupied += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(occupied, 7);

        let active = db.sessions().list(Some(RecordState::Running)).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].session.reference, "CONS/00001");
    }

    #[tokio::test]
    async fn test_wrong_category_and_missing_fields() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let repo = db.sessions();

        // A console id booked as a private room
        let err = repo
            .create_session(&catalog.private_session("Alice", &catalog.console.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::WrongResourceCategory { .. })));

        let err = repo
            .create_session(&catalog.private_session("  ", &catalog.room.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let public_without_kind = NewSession {
            customer: "Alice".to_string(),
            session_type: SessionType::Public,
            individual_type: None,
            resource_id: catalog.console.id.clone(),
        };
        let err = repo.create_session(&public_without_kind).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let private_with_kind = NewSession {
            individual_type: Some(IndividualType::Console),
            ..catalog.private_session("Alice", &catalog.room.id)
        };
        assert!(repo.create_session(&private_with_kind).await.is_err());
    }

    #[tokio::test]
    async fn test_finish_prices_ninety_minutes() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let repo = db.sessions();

        let created = repo
            .create_session_at(&catalog.private_session("Alice", &catalog.room.id), t0())
            .await
            .unwrap();
        repo.add_line(
            &created.session.id,
            &NewLineItem {
                product_id: catalog.snack.id.clone(),
                quantity: 2,
                unit_price_cents: None,
                discount_bps: None,
            },
        )
        .await
        .unwrap();

        let finished = repo
            .finish_at(&created.session.id, t0() + Duration::minutes(90))
            .await
            .unwrap();

        assert_eq!(finished.session.state, RecordState::Finished);
        assert_eq!(finished.time_price_cents, 3000);
        assert_eq!(finished.products_total_cents, 1000);
        assert_eq!(finished.total_cents, 4000);

        // The room is free again
        let free = db.catalog().available(ResourceCategory::PrivateRoom).await.unwrap();
        assert_eq!(free.len(), 2);
    }

    #[tokio::test]
    async fn test_finish_requires_ending_after_starting() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let repo = db.sessions();

        let created = repo
            .create_session_at(&catalog.console_session("Alice"), t0())
            .await
            .unwrap();

        let err = repo.finish_at(&created.session.id, t0()).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidTimeRange { .. })));

        let err = repo
            .finish_at(&created.session.id, t0() - Duration::minutes(5))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidTimeRange { .. })));

        // Still running
        assert_eq!(repo.get(&created.session.id).await.unwrap().state, RecordState::Running);
    }

    #[tokio::test]
    async fn test_delete_only_when_available() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let repo = db.sessions();
        let now = t0();

        let running = repo
            .create_session_at(&catalog.console_session("Alice"), now)
            .await
            .unwrap();
        let err = repo.delete(&running.session.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotDeletable { .. })));

        repo.finish_at(&running.session.id, now + Duration::minutes(10))
            .await
            .unwrap();
        let err = repo.delete(&running.session.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotDeletable { .. })));

        let reserved = repo
            .reserve_session_at(
                &catalog.private_session("Bob", &catalog.room.id),
                now + Duration::hours(2),
                now,
            )
            .await
            .unwrap();
        repo.delete(&reserved.session.id).await.unwrap();
        assert!(matches!(
            repo.get(&reserved.session.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_reservation_holds_resource_and_is_promoted() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let repo = db.sessions();
        let now = t0();

        let err = repo
            .reserve_session_at(&catalog.private_session("Alice", &catalog.room.id), now, now)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidTimeRange { .. })));

        let reserved = repo
            .reserve_session_at(
                &catalog.private_session("Alice", &catalog.room.id),
                now + Duration::minutes(30),
                now,
            )
            .await
            .unwrap();
        assert_eq!(reserved.session.state, RecordState::Available);

        // Held while available
        let err = repo
            .create_session_at(&catalog.private_session("Bob", &catalog.room.id), now)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ResourceOccupied { .. })));

        assert_eq!(repo.promote_due_reservations(now).await.unwrap(), 0);
        assert_eq!(
            repo.promote_due_reservations(now + Duration::minutes(30)).await.unwrap(),
            1
        );
        assert_eq!(repo.get(&reserved.session.id).await.unwrap().state, RecordState::Running);
    }

    #[tokio::test]
    async fn test_explicit_start_of_reservation() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let repo = db.sessions();
        let now = t0();

        let reserved = repo
            .reserve_session_at(&catalog.table_session("Alice"), now + Duration::minutes(5), now)
            .await
            .unwrap();

        let started = repo
            .mark_running_at(&reserved.session.id, now + Duration::minutes(6))
            .await
            .unwrap();
        assert_eq!(started.session.state, RecordState::Running);
        assert_eq!(started.session.starting_time, now + Duration::minutes(5));

        let err = repo.mark_running(&reserved.session.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_lines_frozen_once_finished() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let repo = db.sessions();

        let created = repo
            .create_session_at(&catalog.console_session("Alice"), t0())
            .await
            .unwrap();
        let line = repo
            .add_line(
                &created.session.id,
                &NewLineItem {
                    product_id: catalog.snack.id.clone(),
                    quantity: 1,
                    unit_price_cents: Some(300),
                    discount_bps: Some(1000),
                },
            )
            .await
            .unwrap();
        assert_eq!(line.unit_price_cents, 300);
        assert_eq!(line.name_snapshot, "Chips");

        repo.finish_at(&created.session.id, t0() + Duration::minutes(1))
            .await
            .unwrap();

        let err = repo.remove_line(&created.session.id, &line.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidTransition { .. })));
        assert_eq!(repo.get_detail(&created.session.id).await.unwrap().lines.len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_unit_price_is_rejected() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let repo = db.sessions();

        let created = repo
            .create_session_at(&catalog.console_session("Alice"), t0())
            .await
            .unwrap();
        let err = repo
            .add_line(
                &created.session.id,
                &NewLineItem {
                    product_id: catalog.snack.id.clone(),
                    quantity: 2,
                    unit_price_cents: Some(i64::MAX / 2 + 1),
                    discount_bps: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        // The record stays readable and nothing was stored
        let detail = repo.get_detail(&created.session.id).await.unwrap();
        assert!(detail.lines.is_empty());
        assert_eq!(repo.list(None).await.unwrap().len(), 1);
    }
}
