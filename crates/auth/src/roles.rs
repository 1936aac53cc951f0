use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of a user within its restaurant.
///
/// The set is closed. There is no seniority ordering between variants; what a
/// role may do is decided only by the explicit role sets in
/// [`crate::permissions`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Owner,
    Manager,
    KitchenStaff,
    Waitstaff,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Owner, Role::Manager, Role::KitchenStaff, Role::Waitstaff];

    /// Wire form, as stored in the profile table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "OWNER",
            Role::Manager => "MANAGER",
            Role::KitchenStaff => "KITCHEN_STAFF",
            Role::Waitstaff => "WAITSTAFF",
        }
    }

    /// Human-readable label for badges and menus.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::Manager => "Manager",
            Role::KitchenStaff => "Kitchen Staff",
            Role::Waitstaff => "Waitstaff",
        }
    }

    pub(crate) const fn bit(self) -> u8 {
        match self {
            Role::Owner => 1 << 0,
            Role::Manager => 1 << 1,
            Role::KitchenStaff => 1 << 2,
            Role::Waitstaff => 1 << 3,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
