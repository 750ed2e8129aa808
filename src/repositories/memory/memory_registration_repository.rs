// src/repositories/memory/memory_registration_repository.rs
//
// Registrations are stored flat, by scout and event id, and embed the
// current scout and event on every read.

use std::sync::Arc;

use log::{debug, warn};

use super::database::Tables;
use super::{stored, InMemoryDatabase};
use crate::domain::{Id, Registration};
use crate::error::AppResult;
use crate::repositories::mapper::RegistrationRecord;
use crate::repositories::{RegistrationRepository, VersionedStore};

pub struct InMemoryRegistrationRepository {
    db: Arc<InMemoryDatabase>,
}

impl InMemoryRegistrationRepository {
    pub fn new(db: Arc<InMemoryDatabase>) -> Self {
        Self { db }
    }

    fn select(&self, keep: impl Fn(&RegistrationRecord) -> bool) -> AppResult<Vec<Registration>> {
        let tables = self.db.lock();
        tables.embed_registrations(tables.registrations.values().filter(|r| keep(r)))
    }
}

fn reload(tables: &Tables, id: Id) -> AppResult<Option<Registration>> {
    Ok(tables
        .embed_registrations(tables.registrations.get(id))?
        .into_iter()
        .next())
}

impl VersionedStore<Registration> for InMemoryRegistrationRepository {
    fn create(&self, registration: &Registration) -> AppResult<Registration> {
        let record = RegistrationRecord::from_registration(registration)?;
        let mut tables = self.db.lock();
        tables.check_registration(&record)?;
        let id = tables.registrations.insert(record);

        debug!("Created registration {}", id);
        stored(reload(&tables, id)?, id)
    }

    fn update(&self, registration: &Registration) -> AppResult<Registration> {
        let record = RegistrationRecord::from_registration(registration)?;
        let mut tables = self.db.lock();
        let id = tables
            .registrations
            .check_version(&record)
            .inspect_err(|err| {
                warn!("Rejected registration update: {}", err);
            })?;
        tables.check_registration(&record)?;
        let version = record.version + 1;
        tables.registrations.replace(id, record);

        debug!("Updated registration {} to version {}", id, version);
        stored(reload(&tables, id)?, id)
    }

    fn delete(&self, id: Id) -> AppResult<()> {
        if self.db.lock().registrations.remove(id).is_some() {
            debug!("Deleted registration {}", id);
        }
        Ok(())
    }

    fn find_by_id(&self, id: Id) -> AppResult<Option<Registration>> {
        reload(&self.db.lock(), id)
    }

    fn find_all(&self) -> AppResult<Vec<Registration>> {
        self.select(|_| true)
    }
}

impl RegistrationRepository for InMemoryRegistrationRepository {
    fn find_by_event_id(&self, event_id: Id) -> AppResult<Vec<Registration>> {
        self.select(|r| r.event_id == event_id)
    }

    fn find_by_scout_id(&self, scout_id: Id) -> AppResult<Vec<Registration>> {
        self.select(|r| r.scout_id == scout_id)
    }
}
