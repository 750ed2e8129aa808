// src/repositories/memory/memory_group_repository.rs

use std::sync::Arc;

use log::{debug, warn};

use super::{stored, InMemoryDatabase};
use crate::domain::{Group, Id};
use crate::error::AppResult;
use crate::repositories::{GroupRepository, VersionedStore};

pub struct InMemoryGroupRepository {
    db: Arc<InMemoryDatabase>,
}

impl InMemoryGroupRepository {
    pub fn new(db: Arc<InMemoryDatabase>) -> Self {
        Self { db }
    }
}

impl VersionedStore<Group> for InMemoryGroupRepository {
    fn create(&self, group: &Group) -> AppResult<Group> {
        let mut tables = self.db.lock();
        let id = tables.groups.insert(group.clone());

        debug!("Created group {}", id);
        stored(tables.groups.get(id).cloned(), id)
    }

    fn update(&self, group: &Group) -> AppResult<Group> {
        let mut tables = self.db.lock();
        let id = tables.groups.check_version(group).inspect_err(|err| {
            warn!("Rejected group update: {}", err);
        })?;
        tables.groups.replace(id, group.clone());

        debug!("Updated group {} to version {}", id, group.version + 1);
        stored(tables.groups.get(id).cloned(), id)
    }

    /// Also removes the group from every event and scout
    fn delete(&self, id: Id) -> AppResult<()> {
        if self.db.lock().remove_group(id) {
            debug!("Deleted group {}", id);
        }
        Ok(())
    }

    fn find_by_id(&self, id: Id) -> AppResult<Option<Group>> {
        Ok(self.db.lock().groups.get(id).cloned())
    }

    fn find_all(&self) -> AppResult<Vec<Group>> {
        Ok(self.db.lock().groups.values().cloned().collect())
    }
}

impl GroupRepository for InMemoryGroupRepository {}
