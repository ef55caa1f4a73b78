//! Shared types for the order and inventory backend.

pub mod money;
pub mod types;

pub use money::{Money, MoneyError};
pub use types::{CategoryId, OrderId, ProductId};
