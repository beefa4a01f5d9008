use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AuthError;

/// Permission groups a user can belong to.
///
/// The set is closed: role names coming from storage or requests are parsed
/// into this enum at the boundary, and authorization compares variants, not
/// strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Administers the application.
    #[serde(rename = "Administrator")]
    Administrator,
    /// Every user of the application.
    #[serde(rename = "Basic User")]
    BasicUser,
    /// Can access recipes.
    #[serde(rename = "Recipe User")]
    RecipeUser,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Administrator, Role::BasicUser, Role::RecipeUser];

    /// Canonical name, as stored in the `roles` table.
    pub fn name(self) -> &'static str {
        match self {
            Role::Administrator => "Administrator",
            Role::BasicUser => "Basic User",
            Role::RecipeUser => "Recipe User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AuthError::Validation(format!("unknown role: {wanted}")))
    }
}
