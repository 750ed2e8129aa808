// src/repositories/event_repository.rs

use crate::domain::{Event, Id};
use crate::error::AppResult;
use crate::repositories::VersionedStore;

pub trait EventRepository: VersionedStore<Event> {
    /// Events explicitly associated with `group_id`, ordered by id.
    ///
    /// Each returned event carries its complete participating group set.
    /// Events open to all groups (empty set) are not included.
    fn find_by_group_id(&self, group_id: Id) -> AppResult<Vec<Event>>;
}
