//! Order engine error types.

use common::ProductId;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while placing or reading orders.
///
/// Every variant returned by `place_order` means nothing was persisted.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The request itself is malformed (no items, bad quantity or price).
    #[error("Invalid item: {reason}")]
    InvalidItem { reason: String },

    /// A line item referenced a product that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Fewer units are in stock than a line item requested.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },

    /// The store could not be reached or a statement failed.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    /// Every statement succeeded but the commit did not.
    #[error("Transaction aborted: {0}")]
    TransactionAborted(#[source] StoreError),
}

impl OrderError {
    pub fn invalid_item(reason: impl Into<String>) -> Self {
        OrderError::InvalidItem {
            reason: reason.into(),
        }
    }

    /// Stable name of the failure class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::InvalidItem { .. } => ErrorKind::InvalidItem,
            OrderError::ProductNotFound(_) => ErrorKind::ProductNotFound,
            OrderError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            OrderError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            OrderError::TransactionAborted(_) => ErrorKind::TransactionAborted,
        }
    }
}

/// Failure class of an [`OrderError`], used in logs, metrics and responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidItem,
    ProductNotFound,
    InsufficientStock,
    StoreUnavailable,
    TransactionAborted,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidItem => "InvalidItem",
            ErrorKind::ProductNotFound => "ProductNotFound",
            ErrorKind::InsufficientStock => "InsufficientStock",
            ErrorKind::StoreUnavailable => "StoreUnavailable",
            ErrorKind::TransactionAborted => "TransactionAborted",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            OrderError::invalid_item("empty").kind(),
            ErrorKind::InvalidItem
        );
        assert_eq!(
            OrderError::ProductNotFound(ProductId::new(9)).kind(),
            ErrorKind::ProductNotFound
        );
        assert_eq!(
            OrderError::StoreUnavailable(StoreError::Unavailable("down".into())).kind(),
            ErrorKind::StoreUnavailable
        );
    }

    #[test]
    fn insufficient_stock_message() {
        let err = OrderError::InsufficientStock {
            product_id: ProductId::new(1),
            requested: 3,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product 1: requested 3, available 2"
        );
    }

    #[test]
    fn kind_displays_as_name() {
        assert_eq!(ErrorKind::TransactionAborted.to_string(), "TransactionAborted");
    }
}
