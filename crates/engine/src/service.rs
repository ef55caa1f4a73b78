//! Order engine: atomic order placement and order reads.

use std::time::Instant;

use common::{OrderId, ProductId};
use store::{
    Category, NewOrder, OrderDetail, Product, ProductQuery, StockUpdate, Store, StoreError,
    StoreTransaction,
};

use crate::command::PlaceOrder;
use crate::error::OrderError;

/// Places and reads orders against an injected store.
///
/// The engine never opens connections itself; it borrows a transactional
/// scope from the store for each `place_order` call and releases it on every
/// exit path.
pub struct OrderEngine<S: Store> {
    store: S,
}

impl<S: Store> OrderEngine<S> {
    /// Creates a new order engine over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order: inserts the order, its lines and the matching stock
    /// decrements as one atomic unit.
    ///
    /// On any failure the transaction is rolled back before the error is
    /// returned, so no order, line or stock change persists.
    #[tracing::instrument(skip(self, cmd), fields(items = cmd.items.len()))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<OrderId, OrderError> {
        let started = Instant::now();
        let result = self.try_place_order(&cmd).await;
        metrics::histogram!("place_order_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(order_id) => {
                metrics::counter!("orders_placed_total").increment(1);
                metrics::counter!("order_line_items_total").increment(cmd.items.len() as u64);
                tracing::info!(%order_id, lines = cmd.items.len(), "order placed");
            }
            Err(err) => {
                metrics::counter!("orders_failed_total", "kind" => err.kind().as_str())
                    .increment(1);
                tracing::warn!(kind = %err.kind(), error = %err, "order placement failed");
            }
        }

        result
    }

    async fn try_place_order(&self, cmd: &PlaceOrder) -> Result<OrderId, OrderError> {
        cmd.validate()?;

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(OrderError::StoreUnavailable)?;

        match Self::apply(&mut *tx, cmd).await {
            Ok(order_id) => {
                tx.commit().await.map_err(OrderError::TransactionAborted)?;
                Ok(order_id)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn apply(tx: &mut dyn StoreTransaction, cmd: &PlaceOrder) -> Result<OrderId, OrderError> {
        let order = tx
            .insert_order(&NewOrder {
                customer_name: cmd.customer_name.clone(),
            })
            .await
            .map_err(OrderError::StoreUnavailable)?;

        for line in cmd.lines() {
            tx.insert_line(order.id, &line).await.map_err(|e| match e {
                StoreError::ProductNotFound(product_id) => OrderError::ProductNotFound(product_id),
                other => OrderError::StoreUnavailable(other),
            })?;

            let update = tx
                .decrement_stock(line.product_id, line.quantity)
                .await
                .map_err(OrderError::StoreUnavailable)?;

            match update {
                StockUpdate::Decremented { remaining } => {
                    tracing::debug!(product_id = %line.product_id, remaining, "stock decremented");
                }
                StockUpdate::Insufficient { available } => {
                    return Err(OrderError::InsufficientStock {
                        product_id: line.product_id,
                        requested: line.quantity,
                        available,
                    });
                }
                StockUpdate::Missing => return Err(OrderError::ProductNotFound(line.product_id)),
            }
        }

        Ok(order.id)
    }

    /// Lists all orders, newest first, each with its joined line items.
    ///
    /// A read failure aborts the whole listing.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderDetail>, OrderError> {
        let orders = self
            .store
            .list_orders()
            .await
            .map_err(OrderError::StoreUnavailable)?;
        tracing::debug!(count = orders.len(), "orders listed");
        Ok(orders)
    }

    /// Loads a single order with its line items.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderDetail>, OrderError> {
        self.store
            .get_order(order_id)
            .await
            .map_err(OrderError::StoreUnavailable)
    }

    /// Checks that the underlying store answers.
    pub async fn check_store(&self) -> Result<(), OrderError> {
        self.store.ping().await.map_err(OrderError::StoreUnavailable)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, OrderError> {
        self.store
            .list_categories()
            .await
            .map_err(OrderError::StoreUnavailable)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>, OrderError> {
        self.store
            .list_products(query)
            .await
            .map_err(OrderError::StoreUnavailable)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>, OrderError> {
        self.store
            .get_product(product_id)
            .await
            .map_err(OrderError::StoreUnavailable)
    }
}
