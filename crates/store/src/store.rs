use async_trait::async_trait;
use common::{OrderId, ProductId};

use crate::{
    Category, NewCategory, NewOrder, NewOrderLine, NewProduct, OrderDetail, OrderRecord, Product,
    ProductQuery, Result, StockUpdate,
};

/// Persistent catalog and order storage.
///
/// Reads run outside any caller-visible transaction. Writes that must land
/// together go through a [`StoreTransaction`] obtained from [`Store::begin`].
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    /// Opens a transactional scope.
    ///
    /// Nothing written through the returned handle is visible to other
    /// callers until [`StoreTransaction::commit`] succeeds. Dropping the
    /// handle without committing discards every write.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;

    /// Verifies the store is reachable.
    async fn ping(&self) -> Result<()>;

    /// Lists all categories ordered by id.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Lists products matching a query, ordered by id.
    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>>;

    /// Gets a product with its current stock level.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Inserts a category.
    async fn create_category(&self, category: NewCategory) -> Result<Category>;

    /// Inserts a product. The category must exist.
    async fn create_product(&self, product: NewProduct) -> Result<Product>;

    /// Lists every committed order with its line items.
    ///
    /// Orders are returned newest first (`created_at` descending, then id
    /// descending). Lines keep insertion order.
    async fn list_orders(&self) -> Result<Vec<OrderDetail>>;

    /// Gets a single committed order with its line items.
    async fn get_order(&self, id: OrderId) -> Result<Option<OrderDetail>>;
}

/// An open write scope against the store.
///
/// The handle is exclusively owned by one caller. It is released when
/// `commit` or `rollback` consumes it, or when it is dropped.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Inserts an order header and returns it with its assigned id and timestamp.
    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderRecord>;

    /// Inserts a line item under an order.
    ///
    /// Fails with [`crate::StoreError::ProductNotFound`] when the product
    /// does not exist.
    async fn insert_line(&mut self, order_id: OrderId, line: &NewOrderLine) -> Result<()>;

    /// Reduces a product's stock by `quantity` only if at least `quantity`
    /// units are available.
    async fn decrement_stock(&mut self, product_id: ProductId, quantity: i32)
    -> Result<StockUpdate>;

    /// Makes every write in this scope durable and visible.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discards every write in this scope.
    async fn rollback(self: Box<Self>) -> Result<()>;
}
