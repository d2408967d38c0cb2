//! Claims carried by a storefront credential.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role granted to a principal at issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Client,
    Seller,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::Seller => "SELLER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a role string is not one of the known wire values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLIENT" => Ok(Role::Client),
            "SELLER" => Ok(Role::Seller),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Fields recovered from a verified credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Id of the user the credential was issued to
    pub user_id: String,
    /// Authenticated principal (normalized email in this service)
    pub subject: String,
    pub role: Option<Role>,
    /// Expiry (milliseconds since epoch)
    pub expires_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_values_round_trip() {
        for role in [Role::Client, Role::Seller] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn role_parsing_is_case_sensitive() {
        assert_eq!(
            "seller".parse::<Role>(),
            Err(UnknownRole("seller".to_string()))
        );
    }

    #[test]
    fn role_serializes_as_wire_value() {
        let json = serde_json::to_string(&Role::Seller).unwrap();
        assert_eq!(json, "\"SELLER\"");
    }
}
