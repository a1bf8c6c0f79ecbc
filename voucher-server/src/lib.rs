//! Voucher Server - inventory and order fulfillment for an
//! education-consultancy storefront
//!
//! # Module structure
//!
//! ```text
//! voucher-server/src/
//! ├── core/          # Config, state, HTTP server
//! ├── auth/          # Caller identity from trusted gateway headers
//! ├── catalog/       # Product store
//! ├── inventory/     # Voucher code vault
//! ├── pricing/       # Pure quote engine
//! ├── ledger/        # Order store and state machine
//! ├── guard/         # Kill switch and quota policy
//! ├── fulfillment/   # Checkout and settlement orchestration
//! ├── notify/        # Outbound email queue
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # Errors, logging, validation, time
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod core;
pub mod fulfillment;
pub mod guard;
pub mod inventory;
pub mod ledger;
pub mod notify;
pub mod pricing;
pub mod storage;
pub mod utils;

// Re-export common types
pub use auth::Actor;
pub use core::{Config, Server, ServerState};
pub use fulfillment::FulfillmentCoordinator;
pub use guard::{RiskGuard, RiskPolicy};
pub use inventory::VoucherVault;
pub use ledger::OrderLedger;
pub use pricing::PricingEngine;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

/// Load `.env` and initialize logging
///
/// Production writes daily-rolled files under `WORK_DIR/logs`;
/// development logs to stdout.
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    let level = std::env::var("LOG_LEVEL").ok();
    if config.is_production() {
        config.ensure_work_dir_structure()?;
        let log_dir = config.log_dir();
        init_logger_with_file(level.as_deref(), log_dir.to_str());
    } else {
        init_logger_with_file(level.as_deref(), None);
    }
    Ok(())
}
