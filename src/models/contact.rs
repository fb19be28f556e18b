//! Contact lookups for entity recipients (`student:<id>`, `staff:<id>`).

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::Channel;

/// Kind of directory entity a recipient entry can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Student,
    Staff,
}

impl EntityKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::Student => "student",
            EntityKind::Staff => "staff",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Reference to a student or staff record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: Uuid,
}

/// Stored contact addresses of a student or staff member
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct ContactCard {
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl ContactCard {
    pub fn phone(phone: &str) -> Self {
        Self {
            phone: Some(phone.to_string()),
            email: None,
        }
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    /// Address on file for the channel, ignoring blank values
    pub fn address_for(&self, channel: Channel) -> Option<&str> {
        let address = if channel.is_phone_based() {
            self.phone.as_deref()
        } else {
            self.email.as_deref()
        };
        address.map(str::trim).filter(|a| !a.is_empty())
    }
}
