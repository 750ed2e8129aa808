// src/repositories/versioned_store.rs
//
// CRUD + optimistic concurrency contract shared by every backend

use crate::domain::{Id, Versioned};
use crate::error::{AppError, AppResult};

/// Version-checked CRUD over one aggregate type.
///
/// Both the SQLite and the in-memory backends implement this with identical
/// semantics:
///
/// - `create` ignores any supplied id/version, assigns a fresh id, stores the
///   aggregate with version 0 together with its children and associations,
///   and returns the stored aggregate.
/// - `update` succeeds only when `id` names a stored row whose version equals
///   the supplied one. Fields, children and associations are replaced as a
///   unit and the version grows by one. A missing row fails with
///   `AppError::NotFound`; a stale version fails with
///   `AppError::OptimisticLock`. A failed update changes nothing.
/// - `delete` removes the row and cascades to everything it owns. Deleting an
///   unknown id is a no-op.
/// - `find_by_id` / `find_all` return fully reconstructed aggregates;
///   `find_all` is ordered by id ascending.
pub trait VersionedStore<T: Versioned>: Send + Sync {
    fn create(&self, aggregate: &T) -> AppResult<T>;

    fn update(&self, aggregate: &T) -> AppResult<T>;

    fn delete(&self, id: Id) -> AppResult<()>;

    fn find_by_id(&self, id: Id) -> AppResult<Option<T>>;

    fn find_all(&self) -> AppResult<Vec<T>>;
}

/// Id of an aggregate about to be updated; an unsaved aggregate has no row
pub(crate) fn require_id<T: Versioned>(aggregate: &T) -> AppResult<Id> {
    aggregate.id().ok_or(AppError::NotFound {
        entity: T::KIND,
        id: None,
    })
}
