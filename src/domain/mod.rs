// src/domain/mod.rs
//
// Domain Root - aggregates persisted by the repository layer
//
// Aggregates:
// - Group         (no children)
// - Event         (participating groups, association)
// - Scout         (ordered contacts, owned; groups, association)
// - Registration  (embeds the current Scout and Event at read time)
//
// No aggregate holds a back-reference to Registration.

pub mod event;
pub mod group;
pub mod registration;
pub mod scout;

pub use event::Event;
pub use group::Group;
pub use registration::{Registration, RegistrationStatus};
pub use scout::{Contact, Scout};

use thiserror::Error;

/// Store-assigned identifier shared by every aggregate type
pub type Id = i64;

/// An aggregate root carrying a store identity and an optimistic-lock token.
///
/// `id` is `None` until the store assigns one on `create`. `version` starts
/// at 0 and grows by exactly one per successful update.
pub trait Versioned: Clone {
    /// Human readable aggregate name used in errors and logs
    const KIND: &'static str;

    fn id(&self) -> Option<Id>;

    fn version(&self) -> i64;

    /// Returns the aggregate with the given store identity and version
    fn with_identity(self, id: Id, version: i64) -> Self;
}

/// Domain-level errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
