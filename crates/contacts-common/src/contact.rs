use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A stored contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub category_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by a client when creating a contact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewContact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
}

/// Replacement values for an existing contact. Every mutable field is
/// overwritten, matching `PUT` semantics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactChanges {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
}

impl NewContact {
    /// Reject requests that omit the fields a contact cannot exist without.
    pub fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require("email", &self.email)
    }
}

impl ContactChanges {
    pub fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require("email", &self.email)
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(())
}
