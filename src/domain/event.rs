use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Group, Id, Versioned};

/// A happening scouts can register for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Option<Id>,
    pub version: i64,

    pub name: String,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    /// Empty when attendees go directly to the location
    pub meeting_point: String,

    pub location: String,

    /// Free text, empty when there is no cost or it is not yet known
    pub cost: String,

    pub additional_info: String,

    /// Groups that may take part.
    /// An empty set means the event is open to all groups.
    pub participating_groups: BTreeSet<Group>,
}

impl Event {
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            version: 0,
            name: name.into(),
            start_date,
            end_date,
            meeting_point: String::new(),
            location: location.into(),
            cost: String::new(),
            additional_info: String::new(),
            participating_groups: BTreeSet::new(),
        }
    }

    pub fn with_meeting_point(mut self, meeting_point: impl Into<String>) -> Self {
        self.meeting_point = meeting_point.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_cost(mut self, cost: impl Into<String>) -> Self {
        self.cost = cost.into();
        self
    }

    pub fn with_additional_info(mut self, additional_info: impl Into<String>) -> Self {
        self.additional_info = additional_info.into();
        self
    }

    pub fn with_groups<I>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = Group>,
    {
        self.participating_groups = groups.into_iter().collect();
        self
    }

    /// Whether `group_id` is explicitly associated with this event
    pub fn has_group(&self, group_id: Id) -> bool {
        self.participating_groups
            .iter()
            .any(|g| g.id == Some(group_id))
    }

    pub fn is_open_to_all(&self) -> bool {
        self.participating_groups.is_empty()
    }
}

impl Versioned for Event {
    const KIND: &'static str = "Event";

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
