// src/repositories/sqlite/mod.rs
//
// SQLite backend
//
// RULES:
// - Every write runs in one IMMEDIATE transaction: parent row, then children,
//   then a re-read of the stored aggregate, then commit
// - Updates are a single conditional write (WHERE id = ? AND version = ?)
// - Reads go through the join mapper, never through per-row lookups
// - Explicit SQL only

pub mod child_sync;
pub mod sqlite_event_repository;
pub mod sqlite_group_repository;
pub mod sqlite_registration_repository;
pub mod sqlite_scout_repository;

pub use sqlite_event_repository::SqliteEventRepository;
pub use sqlite_group_repository::SqliteGroupRepository;
pub use sqlite_registration_repository::SqliteRegistrationRepository;
pub use sqlite_scout_repository::SqliteScoutRepository;

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::db::PooledConn;
use crate::domain::{Group, Id};
use crate::error::{AppError, AppResult};

/// Starts a write transaction that takes the database write lock up front,
/// so the version check and the write cannot interleave with another writer.
pub(crate) fn begin_write(conn: &mut PooledConn) -> AppResult<rusqlite::Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

/// Starts a read transaction. The first statement fixes the snapshot every
/// later statement in the transaction reads from.
pub(crate) fn begin_read(conn: &mut PooledConn) -> AppResult<rusqlite::Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Deferred)?)
}

/// Explains why a conditional `UPDATE ... WHERE id = ? AND version = ?`
/// touched no row. Must run inside the same transaction as the update.
pub(crate) fn update_conflict(
    conn: &Connection,
    table: &str,
    entity: &'static str,
    id: Id,
    expected: i64,
) -> AppError {
    let sql = format!("SELECT version FROM {} WHERE id = ?1", table);
    let stored = conn
        .query_row(&sql, params![id], |row| row.get::<_, i64>(0))
        .optional();

    match stored {
        Ok(Some(_)) => AppError::OptimisticLock {
            entity,
            id,
            expected,
        },
        Ok(None) => AppError::NotFound {
            entity,
            id: Some(id),
        },
        Err(e) => e.into(),
    }
}

/// Reads the `group_id`, `group_version`, `group_name` columns of a LEFT JOIN.
/// `None` when the join found no group.
pub(crate) fn group_columns(row: &Row) -> rusqlite::Result<Option<(Id, Group)>> {
    let group_id: Option<Id> = row.get("group_id")?;
    let Some(id) = group_id else {
        return Ok(None);
    };

    Ok(Some((
        id,
        Group {
            id: Some(id),
            version: row.get("group_version")?,
            name: row.get("group_name")?,
        },
    )))
}
