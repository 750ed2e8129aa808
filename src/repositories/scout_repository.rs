// src/repositories/scout_repository.rs

use crate::domain::Scout;
use crate::error::AppResult;
use crate::repositories::VersionedStore;

pub trait ScoutRepository: VersionedStore<Scout> {
    /// Scouts whose name contains `name` (case-sensitive), ordered by id
    fn find_by_name(&self, name: &str) -> AppResult<Vec<Scout>>;
}
