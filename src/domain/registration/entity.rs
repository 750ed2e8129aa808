use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::RegistrationStatus;
use crate::domain::{Event, Id, Scout, Versioned};

/// A scout's intent to participate in an event.
///
/// Only the scout and event ids are persisted with the registration. On
/// every read the full, current Scout and Event aggregates are embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: Option<Id>,
    pub version: i64,
    pub scout: Scout,
    pub event: Event,
    /// Special requirements and the like
    pub note: String,
    pub status: RegistrationStatus,
    pub registration_date: NaiveDateTime,
    /// Account that created the registration, typically a parent's
    pub account_id: String,
}

impl Registration {
    pub fn new(
        scout: Scout,
        event: Event,
        registration_date: NaiveDateTime,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            version: 0,
            scout,
            event,
            note: String::new(),
            status: RegistrationStatus::Pending,
            registration_date,
            account_id: account_id.into(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_status(mut self, status: RegistrationStatus) -> Self {
        self.status = status;
        self
    }
}

impl Versioned for Registration {
    const KIND: &'static str = "Registration";

    fn id(&self) -> Option<Id> {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn with_identity(mut self, id: Id, version: i64) -> Self {
        self.id = Some(id);
        self.version = version;
        self
    }
}
