// src/repositories/sqlite/sqlite_event_repository.rs
//
// Event persistence. Participating groups live in `event_groups` and are
// replaced in full on every write.

use std::sync::Arc;

use log::{debug, warn};
use rusqlite::{params, params_from_iter, Connection, Row};

use super::child_sync::sync_event_groups;
use super::{begin_write, group_columns, update_conflict};
use crate::db::ConnectionPool;
use crate::domain::{Event, Id, Versioned};
use crate::error::{AppError, AppResult};
use crate::repositories::mapper::{fold_rows, EventRow, PartialEvent};
use crate::repositories::versioned_store::require_id;
use crate::repositories::{EventRepository, VersionedStore};

const EVENT_SELECT: &str = "
    SELECT
        e.id              AS event_id,
        e.version         AS event_version,
        e.name            AS event_name,
        e.start_date      AS start_date,
        e.end_date        AS end_date,
        e.meeting_point   AS meeting_point,
        e.location        AS location,
        e.cost            AS cost,
        e.additional_info AS additional_info,
        g.id              AS group_id,
        g.version         AS group_version,
        g.name            AS group_name
    FROM events e
    LEFT JOIN event_groups eg ON eg.event_id = e.id
    LEFT JOIN member_groups g ON g.id = eg.group_id";

/// Which events a select returns
#[derive(Debug, Clone, Copy)]
pub(crate) enum EventFilter {
    All,
    Id(Id),
    /// Events associated with the group. Filters events, not join rows, so
    /// each returned event still carries its complete group set.
    GroupId(Id),
}

impl EventFilter {
    fn where_clause(&self) -> (&'static str, Vec<Id>) {
        match *self {
            EventFilter::All => ("", vec![]),
            EventFilter::Id(id) => ("WHERE e.id = ?1", vec![id]),
            EventFilter::GroupId(group_id) => (
                "WHERE e.id IN (SELECT event_id FROM event_groups WHERE group_id = ?1)",
                vec![group_id],
            ),
        }
    }
}

fn row_to_event_row(row: &Row) -> rusqlite::Result<EventRow> {
    let event_id: Id = row.get("event_id")?;

    let mut event = Event::new(
        row.get::<_, String>("event_name")?,
        row.get("start_date")?,
        row.get("end_date")?,
        row.get::<_, String>("location")?,
    )
    .with_meeting_point(row.get::<_, String>("meeting_point")?)
    .with_cost(row.get::<_, String>("cost")?)
    .with_additional_info(row.get::<_, String>("additional_info")?);
    event.id = Some(event_id);
    event.version = row.get("event_version")?;

    Ok(EventRow {
        event_id,
        event,
        group: group_columns(row)?,
    })
}

/// Reconstructs the events matching `filter`, ordered by id
pub(crate) fn select_events(conn: &Connection, filter: EventFilter) -> AppResult<Vec<Event>> {
    let (clause, args) = filter.where_clause();
    let sql = format!("{} {} ORDER BY e.id", EVENT_SELECT, clause);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), row_to_event_row)?;

    Ok(fold_rows::<PartialEvent, _, _>(rows)?)
}

fn reload(conn: &Connection, id: Id) -> AppResult<Event> {
    select_events(conn, EventFilter::Id(id))?
        .into_iter()
        .next()
        .ok_or(AppError::NotFound {
            entity: Event::KIND,
            id: Some(id),
        })
}

pub struct SqliteEventRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteEventRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

impl VersionedStore<Event> for SqliteEventRepository {
    fn create(&self, event: &Event) -> AppResult<Event> {
        let mut conn = self.pool.get()?;
        let tx = begin_write(&mut conn)?;

        tx.execute(
            "INSERT INTO events (
                version, name, start_date, end_date, meeting_point,
                location, cost, additional_info
            ) VALUES (0, ?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.name,
                event.start_date,
                event.end_date,
                event.meeting_point,
                event.location,
                event.cost,
                event.additional_info,
            ],
        )?;
        let id = tx.last_insert_rowid();

        sync_event_groups(&tx, id, &event.participating_groups)?;
        let stored = reload(&tx, id)?;

        tx.commit()?;

        debug!(
            "Created event {} with {} group(s)",
            id,
            stored.participating_groups.len()
        );
        Ok(stored)
    }

    fn update(&self, event: &Event) -> AppResult<Event> {
        let id = require_id(event)?;
        let mut conn = self.pool.get()?;
        let tx = begin_write(&mut conn)?;

        let updated = tx.execute(
            "UPDATE events SET
                name = ?1, start_date = ?2, end_date = ?3, meeting_point = ?4,
                location = ?5, cost = ?6, additional_info = ?7,
                version = version + 1
             WHERE id = ?8 AND version = ?9",
            params![
                event.name,
                event.start_date,
                event.end_date,
                event.meeting_point,
                event.location,
                event.cost,
                event.additional_info,
                id,
                event.version,
            ],
        )?;

        if updated == 0 {
            let err = update_conflict(&tx, "events", Event::KIND, id, event.version);
            warn!("Rejected event update: {}", err);
            return Err(err);
        }

        sync_event_groups(&tx, id, &event.participating_groups)?;
        let stored = reload(&tx, id)?;

        tx.commit()?;

        debug!("Updated event {} to version {}", id, stored.version);
        Ok(stored)
    }

    fn delete(&self, id: Id) -> AppResult<()> {
        let conn = self.pool.get()?;
        let deleted = conn.execute("DELETE FROM events WHERE id = ?1", params![id])?;
        if deleted > 0 {
            debug!("Deleted event {}", id);
        }
        Ok(())
    }

    fn find_by_id(&self, id: Id) -> AppResult<Option<Event>> {
        let conn = self.pool.get()?;
        Ok(select_events(&conn, EventFilter::Id(id))?.into_iter().next())
    }

    fn find_all(&self) -> AppResult<Vec<Event>> {
        let conn = self.pool.get()?;
        select_events(&conn, EventFilter::All)
    }
}

impl EventRepository for SqliteEventRepository {
    fn find_by_group_id(&self, group_id: Id) -> AppResult<Vec<Event>> {
        let conn = self.pool.get()?;
        select_events(&conn, EventFilter::GroupId(group_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Group;
    use crate::repositories::sqlite::test_support::test_pool;
    use crate::repositories::sqlite::SqliteGroupRepository;
    use chrono::NaiveDate;

    fn camp() -> Event {
        Event::new(
            "Summer Camp",
            NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 22).unwrap(),
            "Lake Forest",
        )
        .with_meeting_point("Scout Hall")
        .with_cost("150 EUR")
    }

    fn setup() -> (tempfile::TempDir, SqliteEventRepository, Vec<Group>) {
        let (dir, pool) = test_pool();
        let groups = SqliteGroupRepository::new(pool.clone());
        let saved = ["Wolves", "Bears", "Foxes"]
            .into_iter()
            .map(|name| groups.create(&Group::new(name)).unwrap())
            .collect();
        (dir, SqliteEventRepository::new(pool), saved)
    }

    #[test]
    fn test_create_persists_columns_and_groups() {
        let (_dir, repo, groups) = setup();

        let created = repo
            .create(&camp().with_groups(groups[..2].to_vec()))
            .unwrap();

        assert_eq!(created.id, Some(1));
        assert_eq!(created.version, 0);
        assert_eq!(created.meeting_point, "Scout Hall");
        assert_eq!(created.participating_groups.len(), 2);
        assert_eq!(repo.find_by_id(1).unwrap(), Some(created));
    }

    #[test]
    fn test_update_replaces_groups() {
        let (_dir, repo, groups) = setup();
        let created = repo
            .create(&camp().with_groups(groups[..2].to_vec()))
            .unwrap();

        let updated = repo
            .update(&created.with_groups([groups[2].clone()]))
            .unwrap();

        assert_eq!(updated.version, 1);
        assert!(updated.has_group(groups[2].id.unwrap()));
        assert!(!updated.has_group(groups[0].id.unwrap()));
        assert_eq!(updated.participating_groups.len(), 1);
    }

    #[test]
    fn test_find_by_group_id_keeps_full_group_sets() {
        let (_dir, repo, groups) = setup();
        repo.create(&camp().with_groups(groups.clone())).unwrap();
        repo.create(&camp().with_groups([groups[2].clone()])).unwrap();

        let found = repo.find_by_group_id(groups[0].id.unwrap()).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].participating_groups.len(), 3);
    }

    #[test]
    fn test_unknown_group_rolls_back_create() {
        let (_dir, repo, _groups) = setup();

        let result = repo.create(&camp().with_groups([Group::new("Ghosts").with_identity(99, 0)]));

        assert!(matches!(result, Err(AppError::ConstraintViolation(_))));
        assert!(repo.find_all().unwrap().is_empty());
    }
}
