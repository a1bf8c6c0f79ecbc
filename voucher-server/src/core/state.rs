use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::core::Config;
use crate::fulfillment::FulfillmentCoordinator;
use crate::guard::{RiskGuard, RiskPolicy};
use crate::inventory::VoucherVault;
use crate::ledger::OrderLedger;
use crate::notify::{LogOnlySender, NotificationQueue, NotifyHandle, NotifyWorker};
use crate::pricing::{NoPromos, PricingConfig, PricingEngine};

/// Shared handles to every component, cloned into each request handler
///
/// | Field | Purpose |
/// |-------|---------|
/// | config | Immutable configuration |
/// | catalog | Product store |
/// | vault | Voucher code inventory |
/// | ledger | Order store and state machine |
/// | pricing | Pure quote computation |
/// | guard | Kill switch and quota policy |
/// | coordinator | Checkout / settlement orchestration |
/// | notify | Notification worker handle, drained at shutdown |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub catalog: CatalogStore,
    pub vault: VoucherVault,
    pub ledger: OrderLedger,
    pub pricing: PricingEngine,
    pub guard: Arc<RiskGuard>,
    pub coordinator: Arc<FulfillmentCoordinator>,
    pub notify: Arc<NotifyHandle>,
}

impl ServerState {
    /// Open the stores under `work_dir/database/`, wire the coordinator
    /// and spawn the notification worker
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        config.ensure_work_dir_structure()?;
        let db_dir = config.database_dir();

        let catalog = CatalogStore::open(db_dir.join("catalog.redb"))?;
        let vault = VoucherVault::open(db_dir.join("inventory.redb"))?;
        let ledger = OrderLedger::open(db_dir.join("orders.redb"))?;

        let pricing = PricingEngine::new(
            PricingConfig {
                gateway_surcharge_percent: config.gateway_surcharge_percent,
                role_discount_percent: config.role_discount_percent,
            },
            Arc::new(NoPromos),
        );
        let guard = Arc::new(RiskGuard::new(RiskPolicy::default()));

        let (queue, rx) = NotificationQueue::new(config.notify_buffer_size);
        let notify = Arc::new(NotifyWorker::new(Arc::new(LogOnlySender)).spawn(rx));

        let coordinator = Arc::new(FulfillmentCoordinator::new(
            catalog.clone(),
            vault.clone(),
            ledger.clone(),
            pricing.clone(),
            guard.clone(),
            queue,
        ));

        tracing::info!(work_dir = %config.work_dir, "Server state initialized");

        Ok(Self {
            config: config.clone(),
            catalog,
            vault,
            ledger,
            pricing,
            guard,
            coordinator,
            notify,
        })
    }
}
