//! Rows held by the catalog and order stores.

use chrono::{DateTime, Utc};
use common::{CategoryId, Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::{Result, StoreError};

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
}

/// A category to be inserted.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A catalog product with its current stock level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: i32,
}

/// A product to be inserted.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: i32,
}

impl NewProduct {
    /// Creates a product with an empty description.
    pub fn new(category_id: CategoryId, name: impl Into<String>, price: Money, stock: i32) -> Self {
        Self {
            category_id,
            name: name.into(),
            description: String::new(),
            price,
            stock,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Checks the product invariants that do not need the store.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StoreError::InvalidProduct("name is required".to_string()));
        }
        if self.price.is_negative() {
            return Err(StoreError::InvalidProduct(format!(
                "price {} must not be negative",
                self.price
            )));
        }
        if self.stock < 0 {
            return Err(StoreError::InvalidProduct(format!(
                "stock {} must not be negative",
                self.stock
            )));
        }
        Ok(())
    }
}

/// An order header to be inserted. The store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_name: String,
}

/// An inserted order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
}

/// A line item to be inserted under an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price captured at order time.
    pub price: Money,
}

/// A committed line item joined with the product's current name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineDetail {
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Money,
    pub product_name: String,
}

/// An order together with all of its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: OrderId,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLineDetail>,
}

impl OrderDetail {
    pub fn from_record(record: OrderRecord, items: Vec<OrderLineDetail>) -> Self {
        Self {
            id: record.id,
            customer_name: record.customer_name,
            created_at: record.created_at,
            items,
        }
    }

    /// Sum of `price * quantity` over all lines.
    pub fn total(&self) -> Money {
        self.items
            .iter()
            .map(|item| item.price.multiply(item.quantity))
            .sum()
    }
}

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockUpdate {
    /// Stock was reduced; `remaining` is the new level.
    Decremented { remaining: i32 },
    /// The product exists but holds fewer units than requested. Nothing changed.
    Insufficient { available: i32 },
    /// No product with that id.
    Missing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_product_validation() {
        let ok = NewProduct::new(CategoryId::new(1), "Widget", Money::from_cents(999), 10);
        assert!(ok.validate().is_ok());

        let negative_price = NewProduct::new(CategoryId::new(1), "Widget", Money::from_cents(-1), 1);
        assert!(matches!(
            negative_price.validate(),
            Err(StoreError::InvalidProduct(_))
        ));

        let negative_stock = NewProduct::new(CategoryId::new(1), "Widget", Money::zero(), -1);
        assert!(matches!(
            negative_stock.validate(),
            Err(StoreError::InvalidProduct(_))
        ));

        let blank = NewProduct::new(CategoryId::new(1), "  ", Money::zero(), 0);
        assert!(blank.validate().is_err());
    }

    #[test]
    fn order_total_sums_line_prices() {
        let order = OrderDetail {
            id: OrderId::new(1),
            customer_name: "Alice".to_string(),
            created_at: Utc::now(),
            items: vec![
                OrderLineDetail {
                    product_id: ProductId::new(1),
                    quantity: 4,
                    price: Money::from_cents(999),
                    product_name: "Widget".to_string(),
                },
                OrderLineDetail {
                    product_id: ProductId::new(2),
                    quantity: 1,
                    price: Money::from_cents(500),
                    product_name: "Gadget".to_string(),
                },
            ],
        };
        assert_eq!(order.total().cents(), 4496);
    }

    #[test]
    fn order_total_saturates_on_oversized_lines() {
        let line = OrderLineDetail {
            product_id: ProductId::new(1),
            quantity: 100_000,
            price: Money::from_cents(100_000_000_000_000),
            product_name: "Yacht".to_string(),
        };
        let order = OrderDetail {
            id: OrderId::new(1),
            customer_name: "Alice".to_string(),
            created_at: Utc::now(),
            items: vec![line.clone(), line],
        };
        assert_eq!(order.total().cents(), i64::MAX);
    }
}
