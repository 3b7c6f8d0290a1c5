//! User profile model and role hierarchy for atelier.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Privilege level attached to a user profile.
///
/// The set is closed and totally ordered; every role has exactly one rank
/// and no two roles share one. Authorization compares ranks, so `Master`
/// dominates everything and `User` dominates nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Public account with no admin privileges.
    #[default]
    User = 1,
    /// May author blog posts.
    Writer = 2,
    /// May edit site content.
    Editor = 3,
    /// May manage settings and users.
    Admin = 4,
    /// Site owner; unrestricted.
    Master = 5,
}

impl Role {
    /// Numeric rank used for hierarchy comparisons.
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    /// Database / wire string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Writer => "writer",
            Role::Editor => "editor",
            Role::Admin => "admin",
            Role::Master => "master",
        }
    }

    /// All roles, lowest rank first.
    pub fn all() -> [Role; 5] {
        [
            Role::User,
            Role::Writer,
            Role::Editor,
            Role::Admin,
            Role::Master,
        ]
    }

    /// Decode a role string from an external source (database row,
    /// persisted slot).
    ///
    /// Unknown values fall back to the least-privileged role rather than
    /// failing, so a corrupt row can never grant access it should not.
    pub fn from_stored(s: &str) -> Role {
        match Role::from_str(s) {
            Ok(role) => role,
            Err(_) => {
                warn!(value = %s, "unknown role in stored data, treating as least privilege");
                Role::User
            }
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "writer" => Ok(Role::Writer),
            "editor" => Ok(Role::Editor),
            "admin" => Ok(Role::Admin),
            "master" => Ok(Role::Master),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// The resolved identity currently operating the admin panel.
///
/// Built by joining the identity provider's session (id, email) with the
/// profile store row (display name, role, avatar). This is the only shape
/// view code ever sees; session handles stay inside the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable identifier from the identity provider.
    pub id: String,
    /// Email address, from the provider.
    pub email: String,
    /// Display name, from the profile store.
    pub display_name: String,
    /// Privilege level, from the profile store.
    pub role: Role,
    /// Avatar URL, from the profile store.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Profile row as stored, keyed by identity id.
#[derive(Debug, Clone)]
pub struct ProfileRecord {
    /// Identity this profile belongs to.
    pub identity_id: String,
    /// Display name.
    pub full_name: String,
    /// Privilege level.
    pub role: Role,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Creation timestamp (UTC).
    pub created_at: NaiveDateTime,
}

/// Data for creating a new profile.
#[derive(Debug, Clone)]
pub struct NewProfile {
    /// Identity the profile belongs to.
    pub identity_id: String,
    /// Display name.
    pub full_name: String,
    /// Privilege level (defaults to `User`).
    pub role: Role,
    /// Avatar URL.
    pub avatar_url: Option<String>,
}

impl NewProfile {
    /// Create a new least-privilege profile.
    pub fn new(identity_id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            identity_id: identity_id.into(),
            full_name: full_name.into(),
            role: Role::User,
            avatar_url: None,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Set the avatar URL.
    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}
