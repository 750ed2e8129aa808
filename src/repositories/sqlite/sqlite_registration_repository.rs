// src/repositories/sqlite/sqlite_registration_repository.rs
//
// Registration persistence. Only the scout and event ids are stored; the
// current Scout and Event are embedded on every read, on the same connection
// as the registration rows.

use std::sync::Arc;

use log::{debug, warn};
use rusqlite::{params, Connection, Row};

use super::sqlite_event_repository::{select_events, EventFilter};
use super::sqlite_scout_repository::{select_scouts, ScoutFilter};
use super::{begin_read, begin_write, update_conflict};
use crate::db::ConnectionPool;
use crate::domain::{Id, Registration, RegistrationStatus, Versioned};
use crate::error::{AppError, AppResult};
use crate::repositories::mapper::{assemble_registrations, RegistrationRecord};
use crate::repositories::versioned_store::require_id;
use crate::repositories::{RegistrationRepository, VersionedStore};

/// Which registrations a select returns
#[derive(Debug, Clone, Copy)]
enum RegistrationFilter {
    All,
    Id(Id),
    ScoutId(Id),
    EventId(Id),
}

impl RegistrationFilter {
    fn where_clause(&self) -> (&'static str, Option<Id>) {
        match *self {
            RegistrationFilter::All => ("", None),
            RegistrationFilter::Id(id) => ("WHERE id = ?1", Some(id)),
            RegistrationFilter::ScoutId(id) => ("WHERE scout_id = ?1", Some(id)),
            RegistrationFilter::EventId(id) => ("WHERE event_id = ?1", Some(id)),
        }
    }
}

fn row_to_record(row: &Row) -> rusqlite::Result<RegistrationRecord> {
    let status: String = row.get("status")?;
    let status = status.parse::<RegistrationStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(RegistrationRecord {
        id: Some(row.get("id")?),
        version: row.get("version")?,
        scout_id: row.get("scout_id")?,
        event_id: row.get("event_id")?,
        note: row.get("note")?,
        status,
        registration_date: row.get("registration_date")?,
        account_id: row.get("account_id")?,
    })
}

fn select_registrations(
    conn: &Connection,
    filter: RegistrationFilter,
) -> AppResult<Vec<Registration>> {
    let (clause, arg) = filter.where_clause();
    let sql = format!(
        "SELECT id, version, scout_id, event_id, note, status, registration_date, account_id
         FROM registrations {} ORDER BY id",
        clause
    );

    let mut stmt = conn.prepare(&sql)?;
    let records = match arg {
        Some(id) => stmt.query_map(params![id], row_to_record)?,
        None => stmt.query_map([], row_to_record)?,
    }
    .collect::<Result<Vec<_>, _>>()?;

    assemble_registrations(
        records,
        |scout_id| Ok(select_scouts(conn, ScoutFilter::Id(scout_id))?.into_iter().next()),
        |event_id| Ok(select_events(conn, EventFilter::Id(event_id))?.into_iter().next()),
    )
}

fn reload(conn: &Connection, id: Id) -> AppResult<Registration> {
    select_registrations(conn, RegistrationFilter::Id(id))?
        .into_iter()
        .next()
        .ok_or(AppError::NotFound {
            entity: Registration::KIND,
            id: Some(id),
        })
}

pub struct SqliteRegistrationRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteRegistrationRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Registration rows and the scouts and events they embed come from one
    /// snapshot, so a concurrent delete cannot leave a reference dangling.
    fn select(&self, filter: RegistrationFilter) -> AppResult<Vec<Registration>> {
        let mut conn = self.pool.get()?;
        let tx = begin_read(&mut conn)?;
        let registrations = select_registrations(&tx, filter)?;
        tx.commit()?;
        Ok(registrations)
    }
}

impl VersionedStore<Registration> for SqliteRegistrationRepository {
    fn create(&self, registration: &Registration) -> AppResult<Registration> {
        let record = RegistrationRecord::from_registration(registration)?;
        let mut conn = self.pool.get()?;
        let tx = begin_write(&mut conn)?;

        tx.execute(
            "INSERT INTO registrations (
                version, scout_id, event_id, note, status, registration_date, account_id
            ) VALUES (0, ?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.scout_id,
                record.event_id,
                record.note,
                record.status.as_str(),
                record.registration_date,
                record.account_id,
            ],
        )?;
        let id = tx.last_insert_rowid();

        let stored = reload(&tx, id)?;

        tx.commit()?;

        debug!(
            "Created registration {} (scout {}, event {})",
            id, record.scout_id, record.event_id
        );
        Ok(stored)
    }

    fn update(&self, registration: &Registration) -> AppResult<Registration> {
        let id = require_id(registration)?;
        let record = RegistrationRecord::from_registration(registration)?;
        let mut conn = self.pool.get()?;
        let tx = begin_write(&mut conn)?;

        let updated = tx.execute(
            "UPDATE registrations SET
                scout_id = ?1, event_id = ?2, note = ?3, status = ?4,
                registration_date = ?5, account_id = ?6, version = version + 1
             WHERE id = ?7 AND version = ?8",
            params![
                record.scout_id,
                record.event_id,
                record.note,
                record.status.as_str(),
                record.registration_date,
                record.account_id,
                id,
                record.version,
            ],
        )?;

        if updated == 0 {
            let err = update_conflict(
                &tx,
                "registrations",
                Registration::KIND,
                id,
                record.version,
            );
            warn!("Rejected registration update: {}", err);
            return Err(err);
        }

        let stored = reload(&tx, id)?;

        tx.commit()?;

        debug!("Updated registration {} to version {}", id, stored.version);
        Ok(stored)
    }

    fn delete(&self, id: Id) -> AppResult<()> {
        let conn = self.pool.get()?;
        let deleted = conn.execute("DELETE FROM registrations WHERE id = ?1", params![id])?;
        if deleted > 0 {
            debug!("Deleted registration {}", id);
        }
        Ok(())
    }

    fn find_by_id(&self, id: Id) -> AppResult<Option<Registration>> {
        Ok(self.select(RegistrationFilter::Id(id))?.into_iter().next())
    }

    fn find_all(&self) -> AppResult<Vec<Registration>> {
        self.select(RegistrationFilter::All)
    }
}

impl RegistrationRepository for SqliteRegistrationRepository {
    fn find_by_event_id(&self, event_id: Id) -> AppResult<Vec<Registration>> {
        self.select(RegistrationFilter::EventId(event_id))
    }

    fn find_by_scout_id(&self, scout_id: Id) -> AppResult<Vec<Registration>> {
        self.select(RegistrationFilter::ScoutId(scout_id))
    }
}
