// src/lib.rs
// ScoutHub - persistence core for scout membership and event registration
//
// Architecture:
// - Domain: plain aggregates (Group, Event, Scout, Registration), no storage
// - Repositories: one versioned store contract, two interchangeable backends
// - Explicit: optimistic concurrency on every update, no silent retries
// - Atomic: an aggregate and its children are written together or not at all

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod db;
pub mod domain;
pub mod error;
pub mod repositories;

// ============================================================================
// PUBLIC API - Domain Entities
// ============================================================================

pub use domain::{
    Contact, DomainError, Event, Group, Id, Registration, RegistrationStatus, Scout, Versioned,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, initialize_database, ConnectionPool, DatabaseConfig};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{
    EventRepository, GroupRepository, InMemoryDatabase, InMemoryEventRepository,
    InMemoryGroupRepository, InMemoryRegistrationRepository, InMemoryScoutRepository,
    RegistrationRepository, ScoutRepository, SqliteEventRepository, SqliteGroupRepository,
    SqliteRegistrationRepository, SqliteScoutRepository, VersionedStore,
};
