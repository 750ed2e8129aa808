// src/repositories/sqlite/sqlite_group_repository.rs
//
// Group persistence. Groups have no children; deleting one cascades to the
// event_groups and scout_groups association rows only.

use std::sync::Arc;

use log::{debug, warn};
use rusqlite::{params, OptionalExtension, Row};

use super::{begin_write, update_conflict};
use crate::db::ConnectionPool;
use crate::domain::{Group, Id, Versioned};
use crate::error::AppResult;
use crate::repositories::versioned_store::require_id;
use crate::repositories::{GroupRepository, VersionedStore};

pub struct SqliteGroupRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteGroupRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_group(row: &Row) -> rusqlite::Result<Group> {
        Ok(Group {
            id: Some(row.get("id")?),
            version: row.get("version")?,
            name: row.get("name")?,
        })
    }
}

impl VersionedStore<Group> for SqliteGroupRepository {
    fn create(&self, group: &Group) -> AppResult<Group> {
        let mut conn = self.pool.get()?;
        let tx = begin_write(&mut conn)?;

        tx.execute(
            "INSERT INTO member_groups (version, name) VALUES (0, ?1)",
            params![group.name],
        )?;
        let id = tx.last_insert_rowid();

        tx.commit()?;

        debug!("Created group {}", id);
        Ok(group.clone().with_identity(id, 0))
    }

    fn update(&self, group: &Group) -> AppResult<Group> {
        let id = require_id(group)?;
        let mut conn = self.pool.get()?;
        let tx = begin_write(&mut conn)?;

        let updated = tx.execute(
            "UPDATE member_groups SET name = ?1, version = version + 1
             WHERE id = ?2 AND version = ?3",
            params![group.name, id, group.version],
        )?;

        if updated == 0 {
            let err = update_conflict(&tx, "member_groups", Group::KIND, id, group.version);
            warn!("Rejected group update: {}", err);
            return Err(err);
        }

        tx.commit()?;

        debug!("Updated group {} to version {}", id, group.version + 1);
        Ok(group.clone().with_identity(id, group.version + 1))
    }

    fn delete(&self, id: Id) -> AppResult<()> {
        let conn = self.pool.get()?;
        let deleted = conn.execute("DELETE FROM member_groups WHERE id = ?1", params![id])?;
        if deleted > 0 {
            debug!("Deleted group {}", id);
        }
        Ok(())
    }

    fn find_by_id(&self, id: Id) -> AppResult<Option<Group>> {
        let conn = self.pool.get()?;

        let group = conn
            .query_row(
                "SELECT id, version, name FROM member_groups WHERE id = ?1",
                params![id],
                Self::row_to_group,
            )
            .optional()?;

        Ok(group)
    }

    fn find_all(&self) -> AppResult<Vec<Group>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare("SELECT id, version, name FROM member_groups ORDER BY id")?;
        let groups = stmt
            .query_map([], Self::row_to_group)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(groups)
    }
}

impl GroupRepository for SqliteGroupRepository {}
