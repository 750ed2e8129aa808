// src/repositories/group_repository.rs

use crate::domain::Group;
use crate::repositories::VersionedStore;

/// Groups have no children and no extra queries.
///
/// Deleting a group removes it from every event and scout association but
/// never deletes the event or scout itself.
pub trait GroupRepository: VersionedStore<Group> {}
