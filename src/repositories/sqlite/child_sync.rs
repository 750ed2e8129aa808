// src/repositories/sqlite/child_sync.rs
//
// Child collection synchronization
//
// Full replace, not diffing: every row of the parent is deleted, then the
// current collection is inserted in full. Given the same input the result is
// always the same, and no orphaned rows survive. Callers run this inside the
// transaction that wrote the parent row.

use std::collections::BTreeSet;

use log::debug;
use rusqlite::{params, Connection};

use crate::domain::{Contact, Group, Id};
use crate::error::{AppError, AppResult};

/// A child or association table keyed by its parent's id
pub(crate) struct ChildTable {
    pub table: &'static str,
    pub parent_column: &'static str,
}

pub(crate) const EVENT_GROUPS: ChildTable = ChildTable {
    table: "event_groups",
    parent_column: "event_id",
};

pub(crate) const SCOUT_GROUPS: ChildTable = ChildTable {
    table: "scout_groups",
    parent_column: "scout_id",
};

pub(crate) const SCOUT_CONTACTS: ChildTable = ChildTable {
    table: "scout_contacts",
    parent_column: "scout_id",
};

impl ChildTable {
    /// Deletes every row belonging to `parent_id`
    pub fn clear(&self, conn: &Connection, parent_id: Id) -> AppResult<usize> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            self.table, self.parent_column
        );
        Ok(conn.execute(&sql, params![parent_id])?)
    }

    #[cfg(test)]
    pub fn count(&self, conn: &Connection, parent_id: Id) -> AppResult<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            self.table, self.parent_column
        );
        let count: i64 = conn.query_row(&sql, params![parent_id], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Replaces the group associations of `parent_id` with `groups`.
    ///
    /// Groups are associated by id; a group without one cannot be referenced.
    /// A group id with no stored group fails on the foreign key.
    fn replace_groups(
        &self,
        conn: &Connection,
        parent_id: Id,
        groups: &BTreeSet<Group>,
    ) -> AppResult<()> {
        let group_ids = association_ids(groups)?;

        self.clear(conn, parent_id)?;

        let sql = format!(
            "INSERT INTO {} ({}, group_id) VALUES (?1, ?2)",
            self.table, self.parent_column
        );
        let mut stmt = conn.prepare(&sql)?;
        for group_id in &group_ids {
            stmt.execute(params![parent_id, group_id])?;
        }

        debug!(
            "Synchronized {} {} -> {} group(s)",
            self.table,
            parent_id,
            group_ids.len()
        );
        Ok(())
    }
}

/// Distinct group ids of a group set
fn association_ids(groups: &BTreeSet<Group>) -> AppResult<BTreeSet<Id>> {
    groups
        .iter()
        .map(|group| {
            group.id.ok_or_else(|| {
                AppError::ConstraintViolation(format!(
                    "Group '{}' must be created before it can be associated",
                    group.name
                ))
            })
        })
        .collect()
}

pub(crate) fn sync_event_groups(
    conn: &Connection,
    event_id: Id,
    groups: &BTreeSet<Group>,
) -> AppResult<()> {
    EVENT_GROUPS.replace_groups(conn, event_id, groups)
}

pub(crate) fn sync_scout_groups(
    conn: &Connection,
    scout_id: Id,
    groups: &BTreeSet<Group>,
) -> AppResult<()> {
    SCOUT_GROUPS.replace_groups(conn, scout_id, groups)
}

/// Replaces the contacts of `scout_id`.
///
/// `contact_order` is the position in `contacts` at the time of the call and
/// is the only source of ordering on reconstruction.
pub(crate) fn sync_scout_contacts(
    conn: &Connection,
    scout_id: Id,
    contacts: &[Contact],
) -> AppResult<()> {
    SCOUT_CONTACTS.clear(conn, scout_id)?;

    let mut stmt = conn.prepare(
        "INSERT INTO scout_contacts (
            scout_id, contact_order, name, phone_number, email, relationship
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    for (position, contact) in contacts.iter().enumerate() {
        stmt.execute(params![
            scout_id,
            position as i64,
            contact.name,
            contact.phone_number,
            contact.email,
            contact.relationship,
        ])?;
    }

    debug!(
        "Synchronized scout_contacts {} -> {} contact(s)",
        scout_id,
        contacts.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_connection, initialize_database};
    use crate::domain::Versioned;

    fn setup() -> Connection {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO member_groups (id, version, name) VALUES (1, 0, 'Wolves'), (2, 0, 'Bears');
             INSERT INTO scouts (id, version, name, birth_date, address, phone_number,
                                 health_insurance, allergy_info, vaccination_info, last_updated)
             VALUES (1, 0, 'John Doe', '2010-05-15', '123 Scout Street', '', 'Health Plus',
                     '', '', '2025-01-01');",
        )
        .unwrap();
        conn
    }

    fn group(id: Id) -> Group {
        Group::new(format!("Group {}", id)).with_identity(id, 0)
    }

    fn contact_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM scout_contacts WHERE scout_id = 1 ORDER BY contact_order")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_replace_removes_rows_no_longer_present() {
        let conn = setup();

        sync_scout_groups(&conn, 1, &[group(1), group(2)].into_iter().collect()).unwrap();
        assert_eq!(SCOUT_GROUPS.count(&conn, 1).unwrap(), 2);

        sync_scout_groups(&conn, 1, &[group(2)].into_iter().collect()).unwrap();
        assert_eq!(SCOUT_GROUPS.count(&conn, 1).unwrap(), 1);

        sync_scout_groups(&conn, 1, &BTreeSet::new()).unwrap();
        assert_eq!(SCOUT_GROUPS.count(&conn, 1).unwrap(), 0);
    }

    #[test]
    fn test_same_group_in_two_versions_is_stored_once() {
        let conn = setup();
        let groups: BTreeSet<Group> = [group(1), group(1).with_identity(1, 4)].into_iter().collect();
        assert_eq!(groups.len(), 2);

        sync_scout_groups(&conn, 1, &groups).unwrap();

        assert_eq!(SCOUT_GROUPS.count(&conn, 1).unwrap(), 1);
    }

    #[test]
    fn test_unsaved_group_is_rejected_before_any_write() {
        let conn = setup();
        sync_scout_groups(&conn, 1, &[group(1)].into_iter().collect()).unwrap();

        let result = sync_scout_groups(&conn, 1, &[Group::new("Unsaved")].into_iter().collect());

        assert!(matches!(result, Err(AppError::ConstraintViolation(_))));
        assert_eq!(SCOUT_GROUPS.count(&conn, 1).unwrap(), 1);
    }

    #[test]
    fn test_missing_group_fails_on_foreign_key() {
        let conn = setup();

        let result = sync_scout_groups(&conn, 1, &[group(99)].into_iter().collect());

        assert!(matches!(result, Err(AppError::ConstraintViolation(_))));
    }

    #[test]
    fn test_contacts_keep_their_positions() {
        let conn = setup();
        let contacts = vec![
            Contact::new("Jane Doe", "555-0124", "jane@example.com", "mother"),
            Contact::new("Jim Doe", "555-0125", "jim@example.com", "father"),
        ];

        sync_scout_contacts(&conn, 1, &contacts).unwrap();
        assert_eq!(contact_names(&conn), vec!["Jane Doe", "Jim Doe"]);

        let reversed: Vec<_> = contacts.into_iter().rev().collect();
        sync_scout_contacts(&conn, 1, &reversed).unwrap();
        assert_eq!(contact_names(&conn), vec!["Jim Doe", "Jane Doe"]);
    }

    #[test]
    fn test_sync_is_idempotent() {
        let conn = setup();
        let contacts = vec![Contact::new("Jane Doe", "555-0124", "jane@example.com", "mother")];

        sync_scout_contacts(&conn, 1, &contacts).unwrap();
        sync_scout_contacts(&conn, 1, &contacts).unwrap();

        assert_eq!(SCOUT_CONTACTS.count(&conn, 1).unwrap(), 1);
    }
}
