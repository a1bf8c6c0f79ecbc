//! Inventory Vault
//!
//! Owns every voucher code and its status. Reservation is the one hot
//! path with real mutual exclusion requirements: redb allows a single
//! write transaction at a time, so two concurrent `reserve` calls are
//! serialized and can never observe the same Available pool. A reserve
//! that cannot be satisfied in full aborts its transaction, leaving every
//! code untouched.
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `codes` | `(product_id, sequence)` | `VoucherCode` | The pool, scan order = import order |
//! | `code_index` | `(product_id, code)` | sequence | Duplicate detection on import |
//! | `id_index` | `code_id` | `(product_id, sequence)` | Administrative lookups |
//! | `counters` | `product_id` | `u64` | Per-product import sequence |

mod vault;

pub use vault::{VaultError, VaultResult, VoucherVault};
