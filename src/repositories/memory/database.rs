// src/repositories/memory/database.rs
//
// Shared state of the in-memory backend.
//
// All tables sit behind one mutex, so every operation, including the version
// check and the write that follows it, is atomic with respect to every other
// operation on any repository sharing the database. Writes compute their full
// result before touching a table; a failed write leaves nothing behind.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::info;

use super::table::Table;
use crate::domain::{Event, Group, Id, Registration, Scout};
use crate::error::{AppError, AppResult};
use crate::repositories::mapper::{assemble_registrations, RegistrationRecord};

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub groups: Table<Group>,
    pub events: Table<Event>,
    pub scouts: Table<Scout>,
    pub registrations: Table<RegistrationRecord>,
}

impl Tables {
    /// Every group must be saved and still stored
    pub fn check_groups(&self, groups: &BTreeSet<Group>) -> AppResult<()> {
        for group in groups {
            let id = group.id.ok_or_else(|| {
                AppError::ConstraintViolation(format!(
                    "Group '{}' must be created before it can be associated",
                    group.name
                ))
            })?;
            if !self.groups.contains(id) {
                return Err(AppError::ConstraintViolation(format!(
                    "Group {} does not exist",
                    id
                )));
            }
        }
        Ok(())
    }

    /// Both ends of a registration must be stored
    pub fn check_registration(&self, record: &RegistrationRecord) -> AppResult<()> {
        if !self.scouts.contains(record.scout_id) {
            return Err(AppError::ConstraintViolation(format!(
                "Scout {} does not exist",
                record.scout_id
            )));
        }
        if !self.events.contains(record.event_id) {
            return Err(AppError::ConstraintViolation(format!(
                "Event {} does not exist",
                record.event_id
            )));
        }
        Ok(())
    }

    /// Current state of each associated group, one per id
    fn resolve_groups(&self, groups: &BTreeSet<Group>) -> BTreeSet<Group> {
        groups
            .iter()
            .filter_map(|group| group.id)
            .collect::<BTreeSet<Id>>()
            .into_iter()
            .filter_map(|id| self.groups.get(id).cloned())
            .collect()
    }

    pub fn event(&self, id: Id) -> Option<Event> {
        self.events.get(id).map(|stored| Event {
            participating_groups: self.resolve_groups(&stored.participating_groups),
            ..stored.clone()
        })
    }

    pub fn scout(&self, id: Id) -> Option<Scout> {
        self.scouts.get(id).map(|stored| Scout {
            groups: self.resolve_groups(&stored.groups),
            ..stored.clone()
        })
    }

    pub fn embed_registrations<'a, I>(&self, records: I) -> AppResult<Vec<Registration>>
    where
        I: IntoIterator<Item = &'a RegistrationRecord>,
    {
        assemble_registrations(
            records.into_iter().cloned(),
            |scout_id| Ok(self.scout(scout_id)),
            |event_id| Ok(self.event(event_id)),
        )
    }

    /// Drops the group and every association to it
    pub fn remove_group(&mut self, id: Id) -> bool {
        if self.groups.remove(id).is_none() {
            return false;
        }
        for event in self.events.values_mut() {
            event.participating_groups.retain(|g| g.id != Some(id));
        }
        for scout in self.scouts.values_mut() {
            scout.groups.retain(|g| g.id != Some(id));
        }
        true
    }

    /// Drops the event and its registrations
    pub fn remove_event(&mut self, id: Id) -> bool {
        if self.events.remove(id).is_none() {
            return false;
        }
        self.registrations.retain(|r| r.event_id != id);
        true
    }

    /// Drops the scout, its contacts and its registrations
    pub fn remove_scout(&mut self, id: Id) -> bool {
        if self.scouts.remove(id).is_none() {
            return false;
        }
        self.registrations.retain(|r| r.scout_id != id);
        true
    }
}

/// The in-memory store shared by the in-memory repositories
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// A panic mid-operation cannot leave a half-applied write behind, so a
    /// poisoned lock still guards consistent tables.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drops all data and restarts every id counter at 1
    pub fn reset(&self) {
        let mut tables = self.lock();
        tables.groups.clear();
        tables.events.clear();
        tables.scouts.clear();
        tables.registrations.clear();
        info!("In-memory database reset");
    }
}
