// src/repositories/memory/mod.rs
//
// In-memory backend
//
// RULES:
// - Same observable behavior as the SQLite backend, including cascades and
//   constraint violations
// - Repositories created over the same `InMemoryDatabase` see one another's
//   data; separate databases are fully isolated
// - Associations are stored by id and resolved to the current group on read

mod database;
pub mod memory_event_repository;
pub mod memory_group_repository;
pub mod memory_registration_repository;
pub mod memory_scout_repository;
mod table;

pub use database::InMemoryDatabase;
pub use memory_event_repository::InMemoryEventRepository;
pub use memory_group_repository::InMemoryGroupRepository;
pub use memory_registration_repository::InMemoryRegistrationRepository;
pub use memory_scout_repository::InMemoryScoutRepository;

use crate::domain::{Id, Versioned};
use crate::error::{AppError, AppResult};

/// The stored aggregate a write just produced
fn stored<T: Versioned>(value: Option<T>, id: Id) -> AppResult<T> {
    value.ok_or(AppError::NotFound {
        entity: T::KIND,
        id: Some(id),
    })
}
