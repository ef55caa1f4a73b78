//! Order placement command.

use common::{Money, ProductId};
use store::NewOrderLine;

use crate::error::OrderError;

/// One requested line of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemRequest {
    /// The product to buy.
    pub product_id: ProductId,

    /// Units requested; must be positive.
    pub quantity: i32,

    /// Unit price to record on the line.
    pub price: Money,
}

impl LineItemRequest {
    pub fn new(product_id: ProductId, quantity: i32, price: Money) -> Self {
        Self {
            product_id,
            quantity,
            price,
        }
    }

    fn to_line(&self) -> NewOrderLine {
        NewOrderLine {
            product_id: self.product_id,
            quantity: self.quantity,
            price: self.price,
        }
    }
}

/// Command to place an order.
///
/// Items are applied in the order given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrder {
    pub customer_name: String,
    pub items: Vec<LineItemRequest>,
}

impl PlaceOrder {
    /// Creates a new PlaceOrder command.
    pub fn new(customer_name: impl Into<String>, items: Vec<LineItemRequest>) -> Self {
        Self {
            customer_name: customer_name.into(),
            items,
        }
    }

    /// Adds a line to the command.
    pub fn with_item(mut self, product_id: ProductId, quantity: i32, price: Money) -> Self {
        self.items.push(LineItemRequest::new(product_id, quantity, price));
        self
    }

    /// Checks everything that can be checked without the store.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.customer_name.trim().is_empty() {
            return Err(OrderError::invalid_item("customer name is required"));
        }
        if self.items.is_empty() {
            return Err(OrderError::invalid_item("order has no items"));
        }
        let mut total = Money::zero();
        for (index, item) in self.items.iter().enumerate() {
            if item.quantity <= 0 {
                return Err(OrderError::invalid_item(format!(
                    "item {index} (product {}): quantity {} must be greater than 0",
                    item.product_id, item.quantity
                )));
            }
            if item.price.is_negative() {
                return Err(OrderError::invalid_item(format!(
                    "item {index} (product {}): price {} must not be negative",
                    item.product_id, item.price
                )));
            }
            total = item
                .price
                .checked_multiply(item.quantity)
                .and_then(|line_total| total.checked_add(line_total))
                .ok_or_else(|| {
                    OrderError::invalid_item(format!(
                        "item {index} (product {}): order total is too large",
                        item.product_id
                    ))
                })?;
        }
        Ok(())
    }

    pub(crate) fn lines(&self) -> impl Iterator<Item = NewOrderLine> + '_ {
        self.items.iter().map(LineItemRequest::to_line)
    }
}
