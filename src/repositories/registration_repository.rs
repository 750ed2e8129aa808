// src/repositories/registration_repository.rs

use crate::domain::{Id, Registration};
use crate::error::AppResult;
use crate::repositories::VersionedStore;

/// Registrations persist only the scout and event ids. Every read embeds the
/// current Scout and Event aggregates.
pub trait RegistrationRepository: VersionedStore<Registration> {
    fn find_by_event_id(&self, event_id: Id) -> AppResult<Vec<Registration>>;

    fn find_by_scout_id(&self, scout_id: Id) -> AppResult<Vec<Registration>>;
}
