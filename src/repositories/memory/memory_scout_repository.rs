// src/repositories/memory/memory_scout_repository.rs

use std::sync::Arc;

use log::{debug, warn};

use super::{stored, InMemoryDatabase};
use crate::domain::{Id, Scout};
use crate::error::AppResult;
use crate::repositories::{ScoutRepository, VersionedStore};

pub struct InMemoryScoutRepository {
    db: Arc<InMemoryDatabase>,
}

impl InMemoryScoutRepository {
    pub fn new(db: Arc<InMemoryDatabase>) -> Self {
        Self { db }
    }

    fn select(&self, mut keep: impl FnMut(&Scout) -> bool) -> Vec<Scout> {
        let tables = self.db.lock();
        let ids: Vec<Id> = tables
            .scouts
            .values()
            .filter(|s| keep(s))
            .filter_map(|s| s.id)
            .collect();
        ids.into_iter().filter_map(|id| tables.scout(id)).collect()
    }
}

impl VersionedStore<Scout> for InMemoryScoutRepository {
    fn create(&self, scout: &Scout) -> AppResult<Scout> {
        let mut tables = self.db.lock();
        tables.check_groups(&scout.groups)?;
        let id = tables.scouts.insert(scout.clone());

        debug!(
            "Created scout {} with {} contact(s)",
            id,
            scout.contacts.len()
        );
        stored(tables.scout(id), id)
    }

    fn update(&self, scout: &Scout) -> AppResult<Scout> {
        let mut tables = self.db.lock();
        let id = tables.scouts.check_version(scout).inspect_err(|err| {
            warn!("Rejected scout update: {}", err);
        })?;
        tables.check_groups(&scout.groups)?;
        tables.scouts.replace(id, scout.clone());

        debug!("Updated scout {} to version {}", id, scout.version + 1);
        stored(tables.scout(id), id)
    }

    /// Also removes the scout's registrations
    fn delete(&self, id: Id) -> AppResult<()> {
        if self.db.lock().remove_scout(id) {
            debug!("Deleted scout {}", id);
        }
        Ok(())
    }

    fn find_by_id(&self, id: Id) -> AppResult<Option<Scout>> {
        Ok(self.db.lock().scout(id))
    }

    fn find_all(&self) -> AppResult<Vec<Scout>> {
        Ok(self.select(|_| true))
    }
}

impl ScoutRepository for InMemoryScoutRepository {
    /// Case-sensitive substring match
    fn find_by_name(&self, name: &str) -> AppResult<Vec<Scout>> {
        Ok(self.select(|s| s.name.contains(name)))
    }
}
