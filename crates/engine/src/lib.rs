//! Order transaction engine.
//!
//! This crate provides:
//! - `PlaceOrder` command and its validation
//! - `OrderEngine`, which places orders atomically and reads them back
//! - `OrderError` taxonomy shared with the API layer

pub mod command;
pub mod error;
pub mod service;

pub use command::{LineItemRequest, PlaceOrder};
pub use error::{ErrorKind, OrderError};
pub use service::OrderEngine;
