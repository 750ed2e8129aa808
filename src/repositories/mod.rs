// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic beyond version checks and referential integrity
// - Every backend implements the same traits with the same semantics
// - One write = one atomic unit: parent, children and version together

pub mod event_repository;
pub mod group_repository;
pub mod id_allocator;
pub mod mapper;
pub mod memory;
pub mod registration_repository;
pub mod scout_repository;
pub mod sqlite;
pub mod versioned_store;


pub use event_repository::EventRepository;
pub use group_repository::GroupRepository;
pub use id_allocator::IdAllocator;
pub use memory::{
    InMemoryDatabase, InMemoryEventRepository, InMemoryGroupRepository,
    InMemoryRegistrationRepository, InMemoryScoutRepository,
};
pub use registration_repository::RegistrationRepository;
pub use scout_repository::ScoutRepository;
pub use sqlite::{
    SqliteEventRepository, SqliteGroupRepository, SqliteRegistrationRepository,
    SqliteScoutRepository,
};
pub use versioned_store::VersionedStore;
