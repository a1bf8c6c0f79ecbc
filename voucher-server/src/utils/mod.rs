//! Utility modules

pub mod error;
pub mod logger;
pub mod time;
pub mod validation;

pub use error::{AppError, AppResult, ok, ok_with_message};
