//! Quota/Risk Guard
//!
//! Pre-checkout gate: global kill switch, identity verification, and a
//! rolling per-role daily order quota. The quota count is derived from
//! the Order Ledger at check time, so there is no second counter that
//! can drift from the orders actually on record.

use crate::auth::Actor;
use crate::ledger::{LedgerError, OrderLedger};
use crate::utils::time::{now_millis, DAY_MILLIS};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared::models::Role;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("system is locked for maintenance")]
    SystemLocked,

    #[error("identity verification required")]
    VerificationRequired,

    #[error("daily order quota reached (limit {limit})")]
    DailyQuotaReached { limit: u32 },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Per-role limits
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RolePolicy {
    /// Orders a user may create in a trailing 24h window
    pub daily_order_limit: u32,
    /// Per-order quantity cap, enforced by the pricing engine
    pub max_quantity_per_order: u32,
}

/// The full risk posture, admin-mutable at runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskPolicy {
    /// Emergency brake: refuses every new order platform-wide
    pub system_locked: bool,
    pub policies: HashMap<Role, RolePolicy>,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        let mut policies = HashMap::new();
        policies.insert(
            Role::Buyer,
            RolePolicy {
                daily_order_limit: 1,
                max_quantity_per_order: 1,
            },
        );
        policies.insert(
            Role::Agent,
            RolePolicy {
                daily_order_limit: 5,
                max_quantity_per_order: 3,
            },
        );
        policies.insert(
            Role::Partner,
            RolePolicy {
                daily_order_limit: 10,
                max_quantity_per_order: 3,
            },
        );
        policies.insert(
            Role::Finance,
            RolePolicy {
                daily_order_limit: 100,
                max_quantity_per_order: 50,
            },
        );
        policies.insert(
            Role::Admin,
            RolePolicy {
                daily_order_limit: 100,
                max_quantity_per_order: 50,
            },
        );
        Self {
            system_locked: false,
            policies,
        }
    }
}

impl RiskPolicy {
    pub fn for_role(&self, role: Role) -> RolePolicy {
        // unknown roles fall back to the strictest posture
        self.policies.get(&role).copied().unwrap_or(RolePolicy {
            daily_order_limit: 1,
            max_quantity_per_order: 1,
        })
    }
}

/// The guard itself; holds the mutable policy
pub struct RiskGuard {
    policy: RwLock<RiskPolicy>,
}

impl RiskGuard {
    pub fn new(policy: RiskPolicy) -> Self {
        Self {
            policy: RwLock::new(policy),
        }
    }

    /// Current policy snapshot (for the admin API)
    pub fn snapshot(&self) -> RiskPolicy {
        self.policy.read().clone()
    }

    pub fn set_locked(&self, locked: bool) {
        self.policy.write().system_locked = locked;
        tracing::warn!(locked, "System lock changed");
    }

    pub fn update_role_policy(&self, role: Role, role_policy: RolePolicy) {
        self.policy.write().policies.insert(role, role_policy);
        tracing::info!(?role, ?role_policy, "Role policy updated");
    }

    /// Quantity cap handed to the pricing engine for this actor
    pub fn quantity_cap(&self, actor: &Actor) -> u32 {
        self.policy.read().for_role(actor.role).max_quantity_per_order
    }

    /// Gate a checkout attempt. Order of checks is fixed: lock first,
    /// then identity, then quota.
    pub fn check(&self, actor: &Actor, ledger: &OrderLedger) -> Result<(), GuardError> {
        let (locked, role_policy) = {
            let policy = self.policy.read();
            (policy.system_locked, policy.for_role(actor.role))
        };

        if locked {
            return Err(GuardError::SystemLocked);
        }
        if !actor.verified {
            return Err(GuardError::VerificationRequired);
        }
        if actor.bypass_quota {
            return Ok(());
        }

        let since = now_millis() - DAY_MILLIS;
        let recent = ledger.count_created_since(&actor.user_id, since)?;
        if recent >= role_policy.daily_order_limit as usize {
            tracing::warn!(
                user_id = %actor.user_id,
                recent,
                limit = role_policy.daily_order_limit,
                "Daily order quota reached"
            );
            return Err(GuardError::DailyQuotaReached {
                limit: role_policy.daily_order_limit,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::NewOrder;
    use shared::models::{PaymentMethod, PriceBreakdown};

    fn ledger_with_orders(user_id: &str, count: usize) -> OrderLedger {
        let ledger = OrderLedger::open_in_memory().unwrap();
        for _ in 0..count {
            ledger
                .create(NewOrder {
                    user_id: user_id.to_string(),
                    buyer_name: "Buyer".to_string(),
                    buyer_email: "buyer@example.com".to_string(),
                    product_id: "prod-1".to_string(),
                    product_name: "Voucher".to_string(),
                    quantity: 1,
                    price: PriceBreakdown {
                        base_amount: 150.0,
                        tier_discount: 0.0,
                        promo_discount: 0.0,
                        bank_charges: 0.0,
                        total_amount: 150.0,
                    },
                    currency: "USD".to_string(),
                    payment_method: PaymentMethod::BankTransfer,
                    bank_reference: Some("TXN".to_string()),
                    proof_attached: true,
                })
                .unwrap();
        }
        ledger
    }

    #[test]
    fn test_system_lock_refuses_everyone() {
        let guard = RiskGuard::new(RiskPolicy::default());
        guard.set_locked(true);
        let ledger = ledger_with_orders("u1", 0);

        // even quota-bypass actors are refused while locked
        let admin = Actor::test_admin();
        assert!(matches!(
            guard.check(&admin, &ledger),
            Err(GuardError::SystemLocked)
        ));

        guard.set_locked(false);
        assert!(guard.check(&admin, &ledger).is_ok());
    }

    #[test]
    fn test_unverified_actor_is_refused() {
        let guard = RiskGuard::new(RiskPolicy::default());
        let ledger = ledger_with_orders("u1", 0);
        let mut buyer = Actor::test_buyer("u1");
        buyer.verified = false;
        assert!(matches!(
            guard.check(&buyer, &ledger),
            Err(GuardError::VerificationRequired)
        ));
    }

    #[test]
    fn test_buyer_quota_of_one() {
        let guard = RiskGuard::new(RiskPolicy::default());
        let buyer = Actor::test_buyer("u1");

        let empty = ledger_with_orders("u1", 0);
        assert!(guard.check(&buyer, &empty).is_ok());

        let full = ledger_with_orders("u1", 1);
        assert!(matches!(
            guard.check(&buyer, &full),
            Err(GuardError::DailyQuotaReached { limit: 1 })
        ));
    }

    #[test]
    fn test_quota_is_scoped_per_user() {
        let guard = RiskGuard::new(RiskPolicy::default());
        let ledger = ledger_with_orders("u1", 1);
        let other = Actor::test_buyer("u2");
        assert!(guard.check(&other, &ledger).is_ok());
    }

    #[test]
    fn test_bypass_flag_skips_quota() {
        let guard = RiskGuard::new(RiskPolicy::default());
        let ledger = ledger_with_orders("u1", 5);
        let mut buyer = Actor::test_buyer("u1");
        buyer.bypass_quota = true;
        assert!(guard.check(&buyer, &ledger).is_ok());
    }

    #[test]
    fn test_runtime_policy_update_takes_effect() {
        let guard = RiskGuard::new(RiskPolicy::default());
        let ledger = ledger_with_orders("u1", 1);
        let buyer = Actor::test_buyer("u1");
        assert!(guard.check(&buyer, &ledger).is_err());

        guard.update_role_policy(
            Role::Buyer,
            RolePolicy {
                daily_order_limit: 3,
                max_quantity_per_order: 2,
            },
        );
        assert!(guard.check(&buyer, &ledger).is_ok());
        assert_eq!(guard.quantity_cap(&buyer), 2);
    }
}
