use serde::{Deserialize, Serialize};

/// A person who can be reached regarding a scout, typically a parent or guardian
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phone_number: String,
    pub email: String,
    /// e.g. mother, father, guardian
    pub relationship: String,
}

impl Contact {
    pub fn new(
        name: impl Into<String>,
        phone_number: impl Into<String>,
        email: impl Into<String>,
        relationship: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone_number: phone_number.into(),
            email: email.into(),
            relationship: relationship.into(),
        }
    }
}
