//! Role Model
//!
//! Closed role set: adding a role means adding a variant here plus a row
//! in the server's risk-policy table, never another string comparison.

use serde::{Deserialize, Serialize};

/// Caller role, established by the upstream identity gateway
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Standard retail buyer
    #[default]
    Buyer,
    /// Booking agent, bulk purchases
    Agent,
    /// Partner consultancy, tiered discounts
    Partner,
    /// Settlement / finance desk
    Finance,
    Admin,
}

impl Role {
    /// May verify, hold or reject orders (settlement authority)
    pub fn can_settle(&self) -> bool {
        matches!(self, Role::Finance | Role::Admin)
    }

    /// May list every order, not just their own
    pub fn can_view_all_orders(&self) -> bool {
        matches!(self, Role::Finance | Role::Admin)
    }

    /// May edit the catalog, import stock and flip the system lock
    pub fn can_administer(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUYER" => Ok(Role::Buyer),
            "AGENT" => Ok(Role::Agent),
            "PARTNER" => Ok(Role::Partner),
            "FINANCE" => Ok(Role::Finance),
            "ADMIN" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Buyer => "BUYER",
            Role::Agent => "AGENT",
            Role::Partner => "PARTNER",
            Role::Finance => "FINANCE",
            Role::Admin => "ADMIN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);
