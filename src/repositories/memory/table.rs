// src/repositories/memory/table.rs
//
// One in-memory table: rows keyed by id plus the id counter for that type.

use std::collections::BTreeMap;

use crate::domain::{Id, Versioned};
use crate::error::{AppError, AppResult};
use crate::repositories::id_allocator::IdAllocator;
use crate::repositories::versioned_store::require_id;

#[derive(Debug)]
pub(crate) struct Table<T> {
    rows: BTreeMap<Id, T>,
    ids: IdAllocator,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            ids: IdAllocator::new(),
        }
    }
}

impl<T: Versioned> Table<T> {
    /// Stores `value` under a fresh id with version 0
    pub fn insert(&mut self, value: T) -> Id {
        let id = self.ids.next_id();
        self.rows.insert(id, value.with_identity(id, 0));
        id
    }

    /// Resolves the row `value` claims to update: it must exist and still
    /// carry the version `value` was read at. Returns the stored id.
    pub fn check_version(&self, value: &T) -> AppResult<Id> {
        let id = require_id(value)?;
        let stored = self.rows.get(&id).ok_or(AppError::NotFound {
            entity: T::KIND,
            id: Some(id),
        })?;

        if stored.version() != value.version() {
            return Err(AppError::OptimisticLock {
                entity: T::KIND,
                id,
                expected: value.version(),
            });
        }
        Ok(id)
    }

    /// Stores `value` at the next version. Call only after `check_version`.
    pub fn replace(&mut self, id: Id, value: T) {
        let version = value.version() + 1;
        self.rows.insert(id, value.with_identity(id, version));
    }

    pub fn remove(&mut self, id: Id) -> Option<T> {
        self.rows.remove(&id)
    }

    pub fn get(&self, id: Id) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.rows.contains_key(&id)
    }

    /// Rows in id order
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.rows.values_mut()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.rows.retain(|_, row| keep(row));
    }

    /// Drops every row; ids start again at 1
    pub fn clear(&mut self) {
        self.rows.clear();
        self.ids.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Group;

    #[test]
    fn test_insert_ignores_supplied_identity() {
        let mut table = Table::default();

        let id = table.insert(Group::new("Wolves").with_identity(40, 3));

        assert_eq!(id, 1);
        let stored = table.get(1).unwrap();
        assert_eq!(stored.id, Some(1));
        assert_eq!(stored.version, 0);
    }

    #[test]
    fn test_check_version_distinguishes_missing_and_stale() {
        let mut table = Table::default();
        table.insert(Group::new("Wolves"));
        let stored = table.get(1).cloned().unwrap();

        assert_eq!(table.check_version(&stored).unwrap(), 1);
        assert!(matches!(
            table.check_version(&stored.clone().with_identity(1, 5)),
            Err(AppError::OptimisticLock { id: 1, expected: 5, .. })
        ));
        assert!(matches!(
            table.check_version(&stored.with_identity(2, 0)),
            Err(AppError::NotFound { id: Some(2), .. })
        ));
    }

    #[test]
    fn test_clear_resets_ids() {
        let mut table = Table::default();
        table.insert(Group::new("Wolves"));
        table.insert(Group::new("Bears"));

        table.clear();

        assert_eq!(table.values().count(), 0);
        assert_eq!(table.insert(Group::new("Foxes")), 1);
    }
}
