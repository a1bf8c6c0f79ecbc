//! Caller identity
//!
//! Authentication and session management are external collaborators: the
//! upstream identity gateway terminates the session and forwards the
//! caller's identity as trusted `x-actor-*` headers. This module only
//! materializes that identity; authorization decisions (roles, quotas,
//! read scoping) happen in the guard, ledger and coordinator.

mod extractor;

use shared::models::Role;

/// The authenticated caller
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub name: String,
    pub role: Role,
    /// Partner tier level, drives the role-based discount
    pub partner_level: u8,
    /// Identity verification completed upstream
    pub verified: bool,
    /// Exempt from the daily order quota
    pub bypass_quota: bool,
    /// Elevated trust flag ("platinum"); required for gateway checkout
    pub gateway_trusted: bool,
}

impl Actor {
    /// Actor label recorded in order status history
    pub fn audit_label(&self) -> String {
        self.user_id.clone()
    }

    #[cfg(test)]
    pub fn test_buyer(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: format!("Buyer {user_id}"),
            role: Role::Buyer,
            partner_level: 0,
            verified: true,
            bypass_quota: false,
            gateway_trusted: false,
        }
    }

    #[cfg(test)]
    pub fn test_finance() -> Self {
        Self {
            user_id: "finance-1".to_string(),
            name: "Finance Desk".to_string(),
            role: Role::Finance,
            partner_level: 0,
            verified: true,
            bypass_quota: false,
            gateway_trusted: false,
        }
    }

    #[cfg(test)]
    pub fn test_admin() -> Self {
        Self {
            user_id: "admin-1".to_string(),
            name: "Admin".to_string(),
            role: Role::Admin,
            partner_level: 0,
            verified: true,
            bypass_quota: true,
            gateway_trusted: true,
        }
    }
}
