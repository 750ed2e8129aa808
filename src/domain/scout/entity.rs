use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Contact;
use crate::domain::{Group, Id, Versioned};

/// A member of the organization who can register for events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scout {
    pub id: Option<Id>,
    pub version: i64,

    pub name: String,

    pub birth_date: NaiveDate,

    pub address: String,

    /// Direct number of the scout, may be empty
    pub phone_number: String,

    pub health_insurance: String,

    pub allergy_info: String,

    pub vaccination_info: String,

    /// Emergency contacts, in the order they should be called
    pub contacts: Vec<Contact>,

    pub groups: BTreeSet<Group>,

    /// Date of the most recent data verification
    pub last_updated: NaiveDate,
}

impl Scout {
    pub fn new(
        name: impl Into<String>,
        birth_date: NaiveDate,
        address: impl Into<String>,
        health_insurance: impl Into<String>,
        last_updated: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            version: 0,
            name: name.into(),
            birth_date,
            address: address.into(),
            phone_number: String::new(),
            health_insurance: health_insurance.into(),
            allergy_info: String::new(),
            vaccination_info: String::new(),
            contacts: Vec::new(),
            groups: BTreeSet::new(),
            last_updated,
        }
    }

    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = phone_number.into();
        self
    }

    pub fn with_allergy_info(mut self, allergy_info: impl Into<String>) -> Self {
        self.allergy_info = allergy_info.into();
        self
    }

    pub fn with_vaccination_info(mut self, vaccination_info: impl Into<String>) -> Self {
        self.vaccination_info = vaccination_info.into();
        self
    }

    pub fn with_contacts(mut self, contacts: Vec<Contact>) -> Self {
        self.contacts = contacts;
        self
    }

    pub fn with_groups<I>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = Group>,
    {
        self.groups = groups.into_iter().collect();
        self
    }

    pub fn belongs_to(&self, group_id: Id) -> bool {
        self.groups.iter().any(|g| g.id == Some(group_id))
    }
}

impl Versioned for Scout {
    const KIND: &'static str = "Scout";

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

impl std::fmt::Display for Scout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
