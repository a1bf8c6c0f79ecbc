//! Fulfillment Coordinator
//!
//! Stateless orchestrator over the catalog, vault, ledger, guard and
//! pricing engine. Owns no persistent state; holds a per-order async
//! mutex so two settlement actors racing on the same order cannot both
//! reserve stock.
//!
//! The only path to `Completed` runs through [`FulfillmentCoordinator`]:
//! reserve codes, write them onto the order atomically, flip the codes to
//! Used, then queue the buyer's email. The email is dispatched strictly
//! after the order is durable and never rolls it back.

use crate::auth::Actor;
use crate::catalog::{CatalogError, CatalogStore};
use crate::guard::{GuardError, RiskGuard};
use crate::inventory::{VaultError, VoucherVault};
use crate::ledger::{LedgerError, NewOrder, OrderLedger};
use crate::notify::{NotificationQueue, NotificationRequest};
use crate::pricing::{PriceError, PricingEngine};
use crate::utils::validation;
use dashmap::DashMap;
use shared::models::{Order, OrderStatus, PaymentMethod, UnitType};
use shared::request::CheckoutRequest;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Price(#[from] PriceError),

    #[error("non-refundable terms must be accepted")]
    TermsNotAccepted,

    #[error("bank reference and proof of transfer are required")]
    IncompleteSettlementProof,

    #[error("gateway payment is restricted to trusted buyers")]
    PaymentMethodRestricted,

    #[error("{0}")]
    Validation(String),

    #[error("access denied: {0}")]
    Forbidden(String),
}

pub type FulfillmentResult<T> = Result<T, FulfillmentError>;

/// Checkout outcome: the Pending order plus an optional promo warning
#[derive(Debug)]
pub struct CheckoutOutcome {
    pub order: Order,
    pub promo_warning: Option<String>,
}

pub struct FulfillmentCoordinator {
    catalog: CatalogStore,
    vault: VoucherVault,
    ledger: OrderLedger,
    pricing: PricingEngine,
    guard: Arc<RiskGuard>,
    notifier: NotificationQueue,
    /// Serializes fulfillment per order id
    order_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FulfillmentCoordinator {
    pub fn new(
        catalog: CatalogStore,
        vault: VoucherVault,
        ledger: OrderLedger,
        pricing: PricingEngine,
        guard: Arc<RiskGuard>,
        notifier: NotificationQueue,
    ) -> Self {
        Self {
            catalog,
            vault,
            ledger,
            pricing,
            guard,
            notifier,
            order_locks: DashMap::new(),
        }
    }

    pub fn ledger(&self) -> &OrderLedger {
        &self.ledger
    }

    /// Submit a checkout: validate, gate, price, persist a Pending order
    pub fn checkout(
        &self,
        actor: &Actor,
        req: CheckoutRequest,
    ) -> FulfillmentResult<CheckoutOutcome> {
        if !req.accept_non_refundable {
            return Err(FulfillmentError::TermsNotAccepted);
        }
        validation::validate_email(&req.buyer_email)
            .map_err(|e| FulfillmentError::Validation(e.to_string()))?;
        validation::validate_optional_text(
            &req.bank_reference,
            "bank_reference",
            validation::MAX_SHORT_TEXT_LEN,
        )
        .map_err(|e| FulfillmentError::Validation(e.to_string()))?;
        validation::validate_optional_text(
            &req.promo_code,
            "promo_code",
            validation::MAX_SHORT_TEXT_LEN,
        )
        .map_err(|e| FulfillmentError::Validation(e.to_string()))?;

        let product = self.catalog.get_active(&req.product_id)?;
        if product.unit_type == UnitType::Course {
            // courses are scheduled off-platform, no codes to allocate
            return Err(FulfillmentError::Validation(
                "course products cannot be ordered through voucher checkout".to_string(),
            ));
        }

        match req.payment_method {
            PaymentMethod::BankTransfer => {
                let has_reference = req
                    .bank_reference
                    .as_deref()
                    .is_some_and(|r| !r.trim().is_empty());
                if !has_reference || !req.proof_attached {
                    return Err(FulfillmentError::IncompleteSettlementProof);
                }
            }
            PaymentMethod::Gateway => {
                if !actor.gateway_trusted {
                    return Err(FulfillmentError::PaymentMethodRestricted);
                }
            }
        }

        self.guard.check(actor, &self.ledger)?;

        let cap = self.guard.quantity_cap(actor);
        let quote = self.pricing.price(
            &product,
            req.quantity,
            actor.partner_level,
            req.payment_method,
            req.promo_code.as_deref(),
            cap,
        )?;

        let order = self.ledger.create(NewOrder {
            user_id: actor.user_id.clone(),
            buyer_name: actor.name.clone(),
            buyer_email: req.buyer_email,
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity: req.quantity,
            price: quote.breakdown,
            currency: product.currency.clone(),
            payment_method: req.payment_method,
            bank_reference: req.bank_reference,
            proof_attached: req.proof_attached,
        })?;

        tracing::info!(
            order_id = %order.id,
            user_id = %actor.user_id,
            product_id = %product.id,
            quantity = req.quantity,
            total = order.price.total_amount,
            "Checkout accepted"
        );

        Ok(CheckoutOutcome {
            order,
            promo_warning: quote.promo_warning,
        })
    }

    /// Manual settlement confirmation: reserve codes and complete the order
    pub async fn verify(
        &self,
        actor: &Actor,
        order_id: &str,
        note: Option<String>,
    ) -> FulfillmentResult<Order> {
        self.require_settler(actor)?;
        self.fulfill(order_id, &actor.audit_label(), note).await
    }

    /// Park a Pending order while settlement evidence is chased
    pub async fn hold(
        &self,
        actor: &Actor,
        order_id: &str,
        note: Option<String>,
    ) -> FulfillmentResult<Order> {
        self.require_settler(actor)?;
        let lock = self.lock_for(order_id);
        let _guard = lock.lock().await;
        let order =
            self.ledger
                .transition(order_id, OrderStatus::Hold, &actor.audit_label(), note)?;
        Ok(order)
    }

    /// Refuse settlement; terminal
    pub async fn reject(
        &self,
        actor: &Actor,
        order_id: &str,
        note: Option<String>,
    ) -> FulfillmentResult<Order> {
        self.require_settler(actor)?;
        let lock = self.lock_for(order_id);
        let guard = lock.lock().await;
        let order = self.ledger.transition(
            order_id,
            OrderStatus::Rejected,
            &actor.audit_label(),
            note.clone(),
        )?;
        drop(guard);
        self.order_locks.remove(order_id);
        self.notifier
            .dispatch(NotificationRequest::OrderStatusEmail {
                buyer_name: order.buyer_name.clone(),
                buyer_email: order.buyer_email.clone(),
                order_id: order.id.clone(),
                status: "REJECTED".to_string(),
                note,
            })
            .await;
        Ok(order)
    }

    /// Buyer-side cancellation, Pending only, never touches inventory
    pub async fn cancel(&self, actor: &Actor, order_id: &str) -> FulfillmentResult<Order> {
        let lock = self.lock_for(order_id);
        let _guard = lock.lock().await;
        let order = self.ledger.get(order_id)?;
        if order.user_id != actor.user_id {
            return Err(FulfillmentError::Forbidden(format!(
                "order {order_id} does not belong to {}",
                actor.user_id
            )));
        }
        let order = self.ledger.transition(
            order_id,
            OrderStatus::Cancelled,
            &actor.audit_label(),
            None,
        )?;
        drop(_guard);
        self.order_locks.remove(order_id);
        Ok(order)
    }

    /// External gateway confirmed payment; fulfill without a settler
    ///
    /// Callback authenticity is the upstream gateway's responsibility.
    pub async fn payment_callback(&self, order_id: &str) -> FulfillmentResult<Order> {
        let order = self.ledger.get(order_id)?;
        if order.payment_method != PaymentMethod::Gateway {
            return Err(FulfillmentError::Validation(
                "payment callback applies to gateway orders only".to_string(),
            ));
        }
        self.fulfill(order_id, "gateway", None).await
    }

    /// The single path to `Completed`
    ///
    /// Under the per-order lock: re-read status, reserve exactly
    /// `quantity` codes (all-or-nothing), attach them and mark Completed
    /// in one ledger write, then flip the codes Reserved -> Used. On
    /// `InsufficientStock` the order is untouched and the caller can
    /// retry after a re-import. Hold, reject and cancel take the same
    /// lock, so no transition can land between the reservation and the
    /// ledger write and strand Reserved codes.
    async fn fulfill(
        &self,
        order_id: &str,
        actor_label: &str,
        note: Option<String>,
    ) -> FulfillmentResult<Order> {
        let lock = self.lock_for(order_id);
        let _guard = lock.lock().await;

        let order = self.ledger.get(order_id)?;
        if !order.status.can_transition_to(OrderStatus::Completed) {
            return Err(LedgerError::IllegalTransition {
                order_id: order.id,
                from: order.status,
                to: OrderStatus::Completed,
            }
            .into());
        }

        let reserved = self.vault.reserve(&order.product_id, order.quantity)?;
        let code_strings: Vec<String> = reserved.iter().map(|c| c.code.clone()).collect();
        let sequences: Vec<u64> = reserved.iter().map(|c| c.sequence).collect();

        let completed = match self
            .ledger
            .fulfill(order_id, code_strings.clone(), actor_label, note)
        {
            Ok(order) => order,
            Err(e) => {
                // codes stay Reserved; an operator resolves them by hand
                tracing::error!(
                    order_id = %order_id,
                    codes = ?sequences,
                    "Order write failed after reservation: {e}"
                );
                return Err(e.into());
            }
        };

        self.vault
            .mark_used(&completed.product_id, &sequences, order_id)?;

        tracing::info!(
            order_id = %order_id,
            actor = %actor_label,
            code_count = completed.voucher_codes.len(),
            "Order fulfilled"
        );

        drop(_guard);
        self.order_locks.remove(order_id);

        self.notifier
            .dispatch(NotificationRequest::VoucherEmail {
                buyer_name: completed.buyer_name.clone(),
                buyer_email: completed.buyer_email.clone(),
                product_name: completed.product_name.clone(),
                codes: completed.voucher_codes.clone(),
                order_id: completed.id.clone(),
            })
            .await;

        Ok(completed)
    }

    fn lock_for(&self, order_id: &str) -> Arc<Mutex<()>> {
        self.order_locks
            .entry(order_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn require_settler(&self, actor: &Actor) -> FulfillmentResult<()> {
        if !actor.role.can_settle() {
            return Err(FulfillmentError::Forbidden(format!(
                "{} lacks settlement authority",
                actor.user_id
            )));
        }
        Ok(())
    }
}
