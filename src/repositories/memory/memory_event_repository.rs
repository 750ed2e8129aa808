// src/repositories/memory/memory_event_repository.rs

use std::sync::Arc;

use log::{debug, warn};

use super::{stored, InMemoryDatabase};
use crate::domain::{Event, Id};
use crate::error::AppResult;
use crate::repositories::{EventRepository, VersionedStore};

pub struct InMemoryEventRepository {
    db: Arc<InMemoryDatabase>,
}

impl InMemoryEventRepository {
    pub fn new(db: Arc<InMemoryDatabase>) -> Self {
        Self { db }
    }
}

impl VersionedStore<Event> for InMemoryEventRepository {
    fn create(&self, event: &Event) -> AppResult<Event> {
        let mut tables = self.db.lock();
        tables.check_groups(&event.participating_groups)?;
        let id = tables.events.insert(event.clone());

        debug!("Created event {}", id);
        stored(tables.event(id), id)
    }

    fn update(&self, event: &Event) -> AppResult<Event> {
        let mut tables = self.db.lock();
        let id = tables.events.check_version(event).inspect_err(|err| {
            warn!("Rejected event update: {}", err);
        })?;
        tables.check_groups(&event.participating_groups)?;
        tables.events.replace(id, event.clone());

        debug!("Updated event {} to version {}", id, event.version + 1);
        stored(tables.event(id), id)
    }

    /// Also removes the event's registrations
    fn delete(&self, id: Id) -> AppResult<()> {
        if self.db.lock().remove_event(id) {
            debug!("Deleted event {}", id);
        }
        Ok(())
    }

    fn find_by_id(&self, id: Id) -> AppResult<Option<Event>> {
        Ok(self.db.lock().event(id))
    }

    fn find_all(&self) -> AppResult<Vec<Event>> {
        let tables = self.db.lock();
        let ids: Vec<Id> = tables.events.values().filter_map(|e| e.id).collect();
        Ok(ids.into_iter().filter_map(|id| tables.event(id)).collect())
    }
}

impl EventRepository for InMemoryEventRepository {
    fn find_by_group_id(&self, group_id: Id) -> AppResult<Vec<Event>> {
        let tables = self.db.lock();
        let ids: Vec<Id> = tables
            .events
            .values()
            .filter(|e| e.has_group(group_id))
            .filter_map(|e| e.id)
            .collect();
        Ok(ids.into_iter().filter_map(|id| tables.event(id)).collect())
    }
}
