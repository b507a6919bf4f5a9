//! Admin principals and the access-level hierarchy

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// Admin privilege tier
///
/// Variant order is the hierarchy: comparisons use the derived `Ord`, so
/// `ReadOnly < Moderator < Administrator < SuperAdmin < SystemOwner`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    #[default]
    ReadOnly,
    Moderator,
    Administrator,
    SuperAdmin,
    SystemOwner,
}

/// A stored access level that is not part of the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized access level: {0}")]
pub struct UnknownAccessLevel(pub String);

impl AccessLevel {
    /// Every level, lowest first
    pub const HIERARCHY: [AccessLevel; 5] = [
        Self::ReadOnly,
        Self::Moderator,
        Self::Administrator,
        Self::SuperAdmin,
        Self::SystemOwner,
    ];

    /// Name as stored in the admins table
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadOnly => "READ_ONLY",
            Self::Moderator => "MODERATOR",
            Self::Administrator => "ADMINISTRATOR",
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::SystemOwner => "SYSTEM_OWNER",
        }
    }

    /// Whether an admin at this level may pass a gate requiring `required`
    pub fn satisfies(&self, required: AccessLevel) -> bool {
        *self >= required
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessLevel {
    type Err = UnknownAccessLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::HIERARCHY
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| UnknownAccessLevel(s.to_string()))
    }
}

/// Raw admin row; the level stays a string until checked against the hierarchy
#[derive(Debug, Clone, FromRow)]
pub struct AdminRecord {
    pub id: String,
    pub access_level: String,
    pub permissions: serde_json::Value,
}

/// Authenticated admin attached to the request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminPrincipal {
    pub id: String,
    pub access_level: AccessLevel,
    /// Opaque to the access-control layer
    pub permissions: serde_json::Value,
}

impl TryFrom<AdminRecord> for AdminPrincipal {
    type Error = UnknownAccessLevel;

    fn try_from(record: AdminRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            access_level: record.access_level.parse()?,
            id: record.id,
            permissions: record.permissions,
        })
    }
}
