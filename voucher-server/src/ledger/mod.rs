//! Order Ledger
//!
//! Sole writer of order state. Orders are never physically deleted; every
//! status change appends to the order's history with actor and timestamp.
//! redb's single write transaction serializes transitions, so two actors
//! racing on the same order cannot both observe Pending and both win.
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | The aggregates |
//! | `user_orders` | `(user_id, order_id)` | `()` | Per-user listing index |
//! | `counters` | `"order_count"` | `u64` | Receipt-number serial |

use crate::auth::Actor;
use crate::storage::{self, StorageError};
use crate::utils::time::{date_stamp, now_millis};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::models::{Order, OrderStatus, PaymentMethod, PriceBreakdown, StatusChange};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Table for the per-user index: key = (user_id, order_id), value = empty
const USER_INDEX_TABLE: TableDefinition<(&str, &str), ()> = TableDefinition::new("user_orders");

/// Table for counters: key = "order_count", value = u64
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const ORDER_COUNT_KEY: &str = "order_count";

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("order not found: {0}")]
    NotFound(String),

    #[error("illegal transition for {order_id}: {from:?} -> {to:?}")]
    IllegalTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("code count mismatch: order wants {expected}, got {actual}")]
    CodeCountMismatch { expected: usize, actual: usize },

    #[error("access denied: {0}")]
    Forbidden(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Everything needed to open a Pending order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: String,
    pub buyer_name: String,
    pub buyer_email: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub price: PriceBreakdown,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub bank_reference: Option<String>,
    pub proof_attached: bool,
}

/// The order ledger
#[derive(Clone)]
pub struct OrderLedger {
    db: Arc<Database>,
}

impl OrderLedger {
    /// Open or create the ledger database at the given path
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let db = storage::open_database(path)?;
        Self::init(db)
    }

    /// Open an in-memory ledger (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> LedgerResult<Self> {
        let db = storage::open_in_memory()?;
        Self::init(db)
    }

    fn init(db: Database) -> LedgerResult<Self> {
        let write_txn = db.begin_write().map_err(StorageError::from)?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE).map_err(StorageError::from)?;
            let _ = write_txn
                .open_table(USER_INDEX_TABLE)
                .map_err(StorageError::from)?;
            let _ = write_txn
                .open_table(COUNTERS_TABLE)
                .map_err(StorageError::from)?;
        }
        write_txn.commit().map_err(StorageError::from)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Persist a new Pending order and hand back its receipt id
    pub fn create(&self, new_order: NewOrder) -> LedgerResult<Order> {
        let now = now_millis();

        let txn = self.db.begin_write().map_err(StorageError::from)?;
        let order = {
            let mut counters = txn.open_table(COUNTERS_TABLE).map_err(StorageError::from)?;
            let count = counters
                .get(ORDER_COUNT_KEY)
                .map_err(StorageError::from)?
                .map(|g| g.value())
                .unwrap_or(0)
                + 1;
            counters
                .insert(ORDER_COUNT_KEY, count)
                .map_err(StorageError::from)?;
            drop(counters);

            let order = Order {
                id: format!("EDU{}{}", date_stamp(), 10000 + count),
                user_id: new_order.user_id,
                product_id: new_order.product_id,
                product_name: new_order.product_name,
                quantity: new_order.quantity,
                price: new_order.price,
                currency: new_order.currency,
                buyer_name: new_order.buyer_name,
                buyer_email: new_order.buyer_email,
                payment_method: new_order.payment_method,
                status: OrderStatus::Pending,
                bank_reference: new_order.bank_reference,
                proof_attached: new_order.proof_attached,
                voucher_codes: Vec::new(),
                created_at: now,
                history: vec![StatusChange {
                    status: OrderStatus::Pending,
                    actor: "checkout".to_string(),
                    timestamp: now,
                    note: None,
                }],
            };

            let mut orders = txn.open_table(ORDERS_TABLE).map_err(StorageError::from)?;
            let value = serde_json::to_vec(&order).map_err(StorageError::from)?;
            orders
                .insert(order.id.as_str(), value.as_slice())
                .map_err(StorageError::from)?;
            drop(orders);

            let mut index = txn
                .open_table(USER_INDEX_TABLE)
                .map_err(StorageError::from)?;
            index
                .insert((order.user_id.as_str(), order.id.as_str()), ())
                .map_err(StorageError::from)?;
            order
        };
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(order_id = %order.id, user_id = %order.user_id, "Order created");
        Ok(order)
    }

    /// Internal unscoped read
    pub fn get(&self, order_id: &str) -> LedgerResult<Order> {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let table = read_txn.open_table(ORDERS_TABLE).map_err(StorageError::from)?;
        match table.get(order_id).map_err(StorageError::from)? {
            Some(guard) => {
                Ok(serde_json::from_slice(guard.value()).map_err(StorageError::from)?)
            }
            None => Err(LedgerError::NotFound(order_id.to_string())),
        }
    }

    /// Read with the access contract enforced: owners see their own
    /// orders, settlement roles see everything
    pub fn get_scoped(&self, order_id: &str, actor: &Actor) -> LedgerResult<Order> {
        let order = self.get(order_id)?;
        if order.user_id != actor.user_id && !actor.role.can_view_all_orders() {
            return Err(LedgerError::Forbidden(format!(
                "order {order_id} does not belong to {}",
                actor.user_id
            )));
        }
        Ok(order)
    }

    /// All orders of one user, newest first
    pub fn list_for_user(&self, user_id: &str) -> LedgerResult<Vec<Order>> {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let index = read_txn
            .open_table(USER_INDEX_TABLE)
            .map_err(StorageError::from)?;
        let orders_table = read_txn.open_table(ORDERS_TABLE).map_err(StorageError::from)?;

        let mut orders = Vec::new();
        let range_start = (user_id, "");
        let range_end = (user_id, "\u{10FFFF}");
        for result in index
            .range(range_start..=range_end)
            .map_err(StorageError::from)?
        {
            let (key, _value) = result.map_err(StorageError::from)?;
            let (_user, order_id) = key.value();
            if let Some(guard) = orders_table.get(order_id).map_err(StorageError::from)? {
                let order: Order =
                    serde_json::from_slice(guard.value()).map_err(StorageError::from)?;
                orders.push(order);
            }
        }
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at));
        Ok(orders)
    }

    /// Every order in the ledger, newest first (settlement roles only)
    pub fn list_all(&self, actor: &Actor) -> LedgerResult<Vec<Order>> {
        if !actor.role.can_view_all_orders() {
            return Err(LedgerError::Forbidden(format!(
                "{} may not list all orders",
                actor.user_id
            )));
        }
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let table = read_txn.open_table(ORDERS_TABLE).map_err(StorageError::from)?;

        let mut orders = Vec::new();
        for result in table.iter().map_err(StorageError::from)? {
            let (_key, value) = result.map_err(StorageError::from)?;
            let order: Order =
                serde_json::from_slice(value.value()).map_err(StorageError::from)?;
            orders.push(order);
        }
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at));
        Ok(orders)
    }

    /// Move an order along the state machine (everything except Completed)
    ///
    /// Completing an order attaches codes and goes through [`fulfill`];
    /// asking `transition` for Completed is always illegal, which is what
    /// keeps the Completed ⟺ codes-attached invariant unforgeable.
    ///
    /// [`fulfill`]: OrderLedger::fulfill
    pub fn transition(
        &self,
        order_id: &str,
        new_status: OrderStatus,
        actor: &str,
        note: Option<String>,
    ) -> LedgerResult<Order> {
        self.mutate(order_id, |order| {
            if new_status == OrderStatus::Completed
                || !order.status.can_transition_to(new_status)
            {
                return Err(LedgerError::IllegalTransition {
                    order_id: order.id.clone(),
                    from: order.status,
                    to: new_status,
                });
            }
            order.status = new_status;
            order.history.push(StatusChange {
                status: new_status,
                actor: actor.to_string(),
                timestamp: now_millis(),
                note: note.clone(),
            });
            Ok(())
        })
    }

    /// Attach exactly `quantity` codes and mark the order Completed, as
    /// one atomic write
    pub fn fulfill(
        &self,
        order_id: &str,
        codes: Vec<String>,
        actor: &str,
        note: Option<String>,
    ) -> LedgerResult<Order> {
        self.mutate(order_id, |order| {
            if !order.status.can_transition_to(OrderStatus::Completed) {
                return Err(LedgerError::IllegalTransition {
                    order_id: order.id.clone(),
                    from: order.status,
                    to: OrderStatus::Completed,
                });
            }
            if codes.len() != order.quantity as usize {
                return Err(LedgerError::CodeCountMismatch {
                    expected: order.quantity as usize,
                    actual: codes.len(),
                });
            }
            order.voucher_codes = codes.clone();
            order.status = OrderStatus::Completed;
            order.history.push(StatusChange {
                status: OrderStatus::Completed,
                actor: actor.to_string(),
                timestamp: now_millis(),
                note: note.clone(),
            });
            Ok(())
        })
    }

    /// Append an audit note without touching status (allowed in any
    /// state, including terminal ones)
    pub fn append_note(&self, order_id: &str, actor: &str, note: String) -> LedgerResult<Order> {
        self.mutate(order_id, |order| {
            order.history.push(StatusChange {
                status: order.status,
                actor: actor.to_string(),
                timestamp: now_millis(),
                note: Some(note.clone()),
            });
            Ok(())
        })
    }

    /// Count of a user's orders created since `since_millis`
    ///
    /// Derived from the ledger at call time; there is no separate counter
    /// to go stale. Cancelled and rejected orders still count.
    pub fn count_created_since(&self, user_id: &str, since_millis: i64) -> LedgerResult<usize> {
        let orders = self.list_for_user(user_id)?;
        Ok(orders.iter().filter(|o| o.created_at >= since_millis).count())
    }

    /// Read-validate-write one order inside a single write transaction
    fn mutate<F>(&self, order_id: &str, mut apply: F) -> LedgerResult<Order>
    where
        F: FnMut(&mut Order) -> LedgerResult<()>,
    {
        let txn = self.db.begin_write().map_err(StorageError::from)?;
        let order = {
            let mut table = txn.open_table(ORDERS_TABLE).map_err(StorageError::from)?;
            let mut order = match table.get(order_id).map_err(StorageError::from)? {
                Some(guard) => serde_json::from_slice::<Order>(guard.value())
                    .map_err(StorageError::from)?,
                None => return Err(LedgerError::NotFound(order_id.to_string())),
            };

            apply(&mut order)?;

            let value = serde_json::to_vec(&order).map_err(StorageError::from)?;
            table
                .insert(order_id, value.as_slice())
                .map_err(StorageError::from)?;
            order
        };
        txn.commit().map_err(StorageError::from)?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests;
