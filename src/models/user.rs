use serde::{Deserialize, Serialize};
use std::fmt;
use super::Id;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Manager,
    Associate,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Associate => "associate",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record as the collaborator stores it. Only the auth service ever
/// sees the `password` field.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: Id,
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub name: String,
    pub role: Role,
}

impl User {
    /// Drops the password, producing the record that sessions and views use.
    pub fn into_public(self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username,
            name: self.name,
            role: self.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PublicUser {
    pub id: Id,
    pub username: String,
    pub name: String,
    pub role: Role,
}

/// Payload for `POST /users`.
#[derive(Debug, Serialize, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}
