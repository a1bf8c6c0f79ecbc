//! API route modules
//!
//! # Structure
//!
//! - [`health`] — liveness probe
//! - [`products`] — catalog CRUD and public quoting
//! - [`inventory`] — code import, stock summary, manual expiry
//! - [`checkout`] — order submission
//! - [`orders`] — order reads and settlement actions
//! - [`system`] — kill switch and risk policy administration

pub mod checkout;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod system;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};
