// src/repositories/sqlite/sqlite_scout_repository.rs
//
// Scout persistence. Contacts are owned rows ordered by `contact_order`;
// groups are associations. Both are replaced in full on every write.

use std::sync::Arc;

use log::{debug, warn};
use rusqlite::{params, params_from_iter, types::Value, Connection, Row};

use super::child_sync::{sync_scout_contacts, sync_scout_groups};
use super::{begin_write, group_columns, update_conflict};
use crate::db::ConnectionPool;
use crate::domain::{Contact, Id, Scout, Versioned};
use crate::error::{AppError, AppResult};
use crate::repositories::mapper::{fold_rows, PartialScout, ScoutRow};
use crate::repositories::versioned_store::require_id;
use crate::repositories::{ScoutRepository, VersionedStore};

// Contacts and groups multiply: a scout with 2 contacts and 3 groups yields
// 6 rows. The mapper deduplicates both sides.
const SCOUT_SELECT: &str = "
    SELECT
        s.id                AS scout_id,
        s.version           AS scout_version,
        s.name              AS scout_name,
        s.birth_date        AS birth_date,
        s.address           AS address,
        s.phone_number      AS phone_number,
        s.health_insurance  AS health_insurance,
        s.allergy_info      AS allergy_info,
        s.vaccination_info  AS vaccination_info,
        s.last_updated      AS last_updated,
        c.contact_order     AS contact_order,
        c.name              AS contact_name,
        c.phone_number      AS contact_phone_number,
        c.email             AS contact_email,
        c.relationship      AS contact_relationship,
        g.id                AS group_id,
        g.version           AS group_version,
        g.name              AS group_name
    FROM scouts s
    LEFT JOIN scout_contacts c ON c.scout_id = s.id
    LEFT JOIN scout_groups sg ON sg.scout_id = s.id
    LEFT JOIN member_groups g ON g.id = sg.group_id";

/// Which scouts a select returns
#[derive(Debug, Clone)]
pub(crate) enum ScoutFilter<'a> {
    All,
    Id(Id),
    /// Case-sensitive substring of the name
    Name(&'a str),
}

impl ScoutFilter<'_> {
    fn where_clause(&self) -> (&'static str, Vec<Value>) {
        match self {
            ScoutFilter::All => ("", vec![]),
            ScoutFilter::Id(id) => ("WHERE s.id = ?1", vec![Value::Integer(*id)]),
            ScoutFilter::Name(name) => (
                "WHERE instr(s.name, ?1) > 0",
                vec![Value::Text(name.to_string())],
            ),
        }
    }
}

fn row_to_contact(row: &Row) -> rusqlite::Result<Option<(i64, Contact)>> {
    let position: Option<i64> = row.get("contact_order")?;
    let Some(position) = position else {
        return Ok(None);
    };

    Ok(Some((
        position,
        Contact {
            name: row.get("contact_name")?,
            phone_number: row.get("contact_phone_number")?,
            email: row.get("contact_email")?,
            relationship: row.get("contact_relationship")?,
        },
    )))
}

fn row_to_scout_row(row: &Row) -> rusqlite::Result<ScoutRow> {
    let scout_id: Id = row.get("scout_id")?;

    let mut scout = Scout::new(
        row.get::<_, String>("scout_name")?,
        row.get("birth_date")?,
        row.get::<_, String>("address")?,
        row.get::<_, String>("health_insurance")?,
        row.get("last_updated")?,
    )
    .with_phone_number(row.get::<_, String>("phone_number")?)
    .with_allergy_info(row.get::<_, String>("allergy_info")?)
    .with_vaccination_info(row.get::<_, String>("vaccination_info")?);
    scout.id = Some(scout_id);
    scout.version = row.get("scout_version")?;

    Ok(ScoutRow {
        scout_id,
        scout,
        contact: row_to_contact(row)?,
        group: group_columns(row)?,
    })
}

/// Reconstructs the scouts matching `filter`, ordered by id
pub(crate) fn select_scouts(conn: &Connection, filter: ScoutFilter<'_>) -> AppResult<Vec<Scout>> {
    let (clause, args) = filter.where_clause();
    let sql = format!("{} {} ORDER BY s.id", SCOUT_SELECT, clause);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args), row_to_scout_row)?;

    Ok(fold_rows::<PartialScout, _, _>(rows)?)
}

fn reload(conn: &Connection, id: Id) -> AppResult<Scout> {
    select_scouts(conn, ScoutFilter::Id(id))?
        .into_iter()
        .next()
        .ok_or(AppError::NotFound {
            entity: Scout::KIND,
            id: Some(id),
        })
}

fn sync_children(conn: &Connection, id: Id, scout: &Scout) -> AppResult<()> {
    sync_scout_contacts(conn, id, &scout.contacts)?;
    sync_scout_groups(conn, id, &scout.groups)
}

pub struct SqliteScoutRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteScoutRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

impl VersionedStore<Scout> for SqliteScoutRepository {
    fn create(&self, scout: &Scout) -> AppResult<Scout> {
        let mut conn = self.pool.get()?;
        let tx = begin_write(&mut conn)?;

        tx.execute(
            "INSERT INTO scouts (
                version, name, birth_date, address, phone_number,
                health_insurance, allergy_info, vaccination_info, last_updated
            ) VALUES (0, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                scout.name,
                scout.birth_date,
                scout.address,
                scout.phone_number,
                scout.health_insurance,
                scout.allergy_info,
                scout.vaccination_info,
                scout.last_updated,
            ],
        )?;
        let id = tx.last_insert_rowid();

        sync_children(&tx, id, scout)?;
        let stored = reload(&tx, id)?;

        tx.commit()?;

        debug!(
            "Created scout {} with {} contact(s), {} group(s)",
            id,
            stored.contacts.len(),
            stored.groups.len()
        );
        Ok(stored)
    }

    fn update(&self, scout: &Scout) -> AppResult<Scout> {
        let id = require_id(scout)?;
        let mut conn = self.pool.get()?;
        let tx = begin_write(&mut conn)?;

        let updated = tx.execute(
            "UPDATE scouts SET
                name = ?1, birth_date = ?2, address = ?3, phone_number = ?4,
                health_insurance = ?5, allergy_info = ?6, vaccination_info = ?7,
                last_updated = ?8, version = version + 1
             WHERE id = ?9 AND version = ?10",
            params![
                scout.name,
                scout.birth_date,
                scout.address,
                scout.phone_number,
                scout.health_insurance,
                scout.allergy_info,
                scout.vaccination_info,
                scout.last_updated,
                id,
                scout.version,
            ],
        )?;

        if updated == 0 {
            let err = update_conflict(&tx, "scouts", Scout::KIND, id, scout.version);
            warn!("Rejected scout update: {}", err);
            return Err(err);
        }

        sync_children(&tx, id, scout)?;
        let stored = reload(&tx, id)?;

        tx.commit()?;

        debug!("Updated scout {} to version {}", id, stored.version);
        Ok(stored)
    }

    fn delete(&self, id: Id) -> AppResult<()> {
        let conn = self.pool.get()?;
        let deleted = conn.execute("DELETE FROM scouts WHERE id = ?1", params![id])?;
        if deleted > 0 {
            debug!("Deleted scout {}", id);
        }
        Ok(())
    }

    fn find_by_id(&self, id: Id) -> AppResult<Option<Scout>> {
        let conn = self.pool.get()?;
        Ok(select_scouts(&conn, ScoutFilter::Id(id))?.into_iter().next())
    }

    fn find_all(&self) -> AppResult<Vec<Scout>> {
        let conn = self.pool.get()?;
        select_scouts(&conn, ScoutFilter::All)
    }
}

impl ScoutRepository for SqliteScoutRepository {
    fn find_by_name(&self, name: &str) -> AppResult<Vec<Scout>> {
        let conn = self.pool.get()?;
        select_scouts(&conn, ScoutFilter::Name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Group;
    use crate::repositories::sqlite::child_sync::{SCOUT_CONTACTS, SCOUT_GROUPS};
    use crate::repositories::sqlite::test_support::test_pool;
    use crate::repositories::sqlite::SqliteGroupRepository;
    use chrono::NaiveDate;

    fn john() -> Scout {
        Scout::new(
            "John Doe",
            NaiveDate::from_ymd_opt(2010, 5, 15).unwrap(),
            "123 Scout Street",
            "Health Plus",
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
        .with_allergy_info("Peanuts")
        .with_contacts(vec![
            Contact::new("Jane Doe", "555-0124", "jane@example.com", "mother"),
            Contact::new("Jim Doe", "555-0125", "jim@example.com", "father"),
        ])
    }

    fn setup() -> (tempfile::TempDir, Arc<ConnectionPool>, SqliteScoutRepository, Vec<Group>) {
        let (dir, pool) = test_pool();
        let groups = SqliteGroupRepository::new(pool.clone());
        let saved = ["Wolves", "Bears", "Foxes"]
            .into_iter()
            .map(|name| groups.create(&Group::new(name)).unwrap())
            .collect();
        let repo = SqliteScoutRepository::new(pool.clone());
        (dir, pool, repo, saved)
    }

    #[test]
    fn test_contacts_and_groups_do_not_multiply() {
        let (_dir, _pool, repo, groups) = setup();

        let created = repo.create(&john().with_groups(groups.clone())).unwrap();

        assert_eq!(created.contacts.len(), 2);
        assert_eq!(created.contacts[0].name, "Jane Doe");
        assert_eq!(created.contacts[1].name, "Jim Doe");
        assert_eq!(created.groups.len(), 3);
        assert_eq!(created.allergy_info, "Peanuts");
    }

    #[test]
    fn test_update_with_empty_children_clears_rows() {
        let (_dir, pool, repo, groups) = setup();
        let created = repo.create(&john().with_groups(groups)).unwrap();

        let updated = repo
            .update(&created.with_contacts(vec![]).with_groups(Vec::new()))
            .unwrap();

        assert!(updated.contacts.is_empty());
        assert!(updated.groups.is_empty());

        let conn = pool.get().unwrap();
        assert_eq!(SCOUT_CONTACTS.count(&conn, 1).unwrap(), 0);
        assert_eq!(SCOUT_GROUPS.count(&conn, 1).unwrap(), 0);
    }

    #[test]
    fn test_failed_update_leaves_children_untouched() {
        let (_dir, _pool, repo, groups) = setup();
        let created = repo.create(&john().with_groups(groups.clone())).unwrap();
        repo.update(&created).unwrap();

        let stale = repo.update(&created.with_contacts(vec![]));

        assert!(matches!(stale, Err(AppError::OptimisticLock { .. })));
        let stored = repo.find_by_id(1).unwrap().unwrap();
        assert_eq!(stored.contacts.len(), 2);
        assert_eq!(stored.version, 1);
    }

    #[test]
    fn test_find_by_name_is_substring_and_case_sensitive() {
        let (_dir, _pool, repo, _groups) = setup();
        repo.create(&john()).unwrap();

        assert_eq!(repo.find_by_name("Doe").unwrap().len(), 1);
        assert_eq!(repo.find_by_name("ohn D").unwrap().len(), 1);
        assert!(repo.find_by_name("doe").unwrap().is_empty());
        assert_eq!(repo.find_by_name("").unwrap().len(), 1);
    }

    #[test]
    fn test_deleting_scout_removes_its_children() {
        let (_dir, pool, repo, groups) = setup();
        repo.create(&john().with_groups(groups)).unwrap();

        repo.delete(1).unwrap();

        let conn = pool.get().unwrap();
        assert_eq!(SCOUT_CONTACTS.count(&conn, 1).unwrap(), 0);
        assert_eq!(SCOUT_GROUPS.count(&conn, 1).unwrap(), 0);
        assert_eq!(repo.find_by_id(1).unwrap(), None);
    }
}
