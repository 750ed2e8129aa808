use serde::{Deserialize, Serialize};

use super::{Id, Versioned};

/// An organizational unit within the scout organization.
///
/// Events and scouts reference groups through association tables; a group
/// never owns them. Names are not required to be unique.
///
/// Ordering is by `id` first, which keeps group sets in a stable order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Group {
    pub id: Option<Id>,
    pub version: i64,
    pub name: String,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            version: 0,
            name: name.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Versioned for Group {
    const KIND: &'static str = "Group";

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

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
