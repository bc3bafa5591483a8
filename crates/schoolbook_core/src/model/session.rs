//! Roles, sessions and the persisted credential table.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Principal,
    Teacher,
    Parent,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Principal => "principal",
            Self::Teacher => "teacher",
            Self::Parent => "parent",
        }
    }

    /// Parses a role name. `cpadmin` is accepted as the legacy alias of
    /// `principal` used by the login form.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "principal" | "cpadmin" => Some(Self::Principal),
            "teacher" => Some(Self::Teacher),
            "parent" => Some(Self::Parent),
            _ => None,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated actor passed explicitly to every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub role: Role,
    pub id: String,
}

impl Session {
    pub fn is_principal(&self) -> bool {
        self.role == Role::Principal
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub name: String,
    pub id: String,
    pub role: Role,
}

/// Versioned login table persisted beside the school document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialTable {
    pub version: u32,
    pub users: Vec<Credential>,
}

pub const CREDENTIAL_TABLE_VERSION: u32 = 1;

impl Default for CredentialTable {
    fn default() -> Self {
        let seed = [
            ("cpadmin", "1111111111111", Role::Principal),
            ("teacher1", "2222222222222", Role::Teacher),
            ("parent1", "3333333333333", Role::Parent),
        ];
        Self {
            version: CREDENTIAL_TABLE_VERSION,
            users: seed
                .into_iter()
                .map(|(name, id, role)| Credential {
                    name: name.to_string(),
                    id: id.to_string(),
                    role,
                })
                .collect(),
        }
    }
}

impl CredentialTable {
    /// Finds a user by case-insensitive name, exact id and exact role.
    pub fn authenticate(&self, name: &str, id: &str, role: Role) -> Option<&Credential> {
        let name = name.trim();
        let id = id.trim();
        self.users.iter().find(|user| {
            user.name.eq_ignore_ascii_case(name) && user.id == id && user.role == role
        })
    }

    /// Appends a login for a newly created teacher.
    ///
    /// Existing entries are left alone, even one with the same name.
    pub fn add_teacher(&mut self, name: &str, id_card: &str) {
        self.users.push(teacher_credential(name, id_card));
    }

    /// Inserts or replaces the teacher login for `id_card`.
    ///
    /// An existing teacher entry matches by id or by case-insensitive name.
    /// Principal and parent logins are never replaced. Names are stored
    /// lowercased.
    pub fn upsert_teacher(&mut self, name: &str, id_card: &str) {
        let entry = teacher_credential(name, id_card);
        match self
            .users
            .iter()
            .position(|user| {
                user.role == Role::Teacher
                    && (user.id == id_card || user.name.eq_ignore_ascii_case(name))
            })
        {
            Some(index) => self.users[index] = entry,
            None => self.users.push(entry),
        }
    }
}

fn teacher_credential(name: &str, id_card: &str) -> Credential {
    Credential {
        name: name.to_lowercase(),
        id: id_card.to_string(),
        role: Role::Teacher,
    }
}
