//! Domain models
//!
//! All enums use `SCREAMING_SNAKE_CASE` on the wire. Monetary amounts are
//! stored as `f64` in currency units, already rounded to 2 decimal places
//! by the pricing engine.

mod order;
mod product;
mod role;
mod voucher;

pub use order::{Order, OrderStatus, PaymentMethod, PriceBreakdown, StatusChange};
pub use product::{Product, TierDiscount, UnitType};
pub use role::{Role, UnknownRole};
pub use voucher::{VoucherCode, VoucherStatus};
