use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::{CategoryId, OrderId, ProductId};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::{
    Category, NewCategory, NewOrder, NewOrderLine, NewProduct, OrderDetail, OrderLineDetail,
    OrderRecord, Product, ProductQuery, Result, StockUpdate, StoreError,
    store::{Store, StoreTransaction},
};

#[derive(Debug, Clone)]
struct StoredLine {
    order_id: OrderId,
    line: NewOrderLine,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, OrderRecord>,
    lines: Vec<StoredLine>,
    last_category_id: i64,
    last_product_id: i64,
    last_order_id: i64,
}

impl Tables {
    fn order_detail(&self, record: &OrderRecord) -> Result<OrderDetail> {
        let items = self
            .lines
            .iter()
            .filter(|stored| stored.order_id == record.id)
            .map(|stored| {
                let product = self
                    .products
                    .get(&stored.line.product_id)
                    .ok_or(StoreError::ProductNotFound(stored.line.product_id))?;
                Ok(OrderLineDetail {
                    product_id: stored.line.product_id,
                    quantity: stored.line.quantity,
                    price: stored.line.price,
                    product_name: product.name.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(OrderDetail::from_record(record.clone(), items))
    }
}

#[derive(Debug, Default)]
struct Faults {
    unavailable: AtomicBool,
    fail_on_commit: AtomicBool,
}

impl Faults {
    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store is marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

/// In-memory store implementation for testing and database-less runs.
///
/// A transaction holds the store's write lock for its whole lifetime and
/// stages its writes on a private copy of the tables, so transactions are
/// serialized and readers never see uncommitted writes.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<Faults>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `begin` and read fail until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes every subsequent commit fail until cleared.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.faults.fail_on_commit.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the number of committed line items across all orders.
    pub async fn line_count(&self) -> usize {
        self.tables.read().await.lines.len()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        self.faults.check_available()?;

        let guard = self.tables.clone().write_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryTransaction {
            guard,
            staged,
            faults: self.faults.clone(),
        }))
    }

    async fn ping(&self) -> Result<()> {
        self.faults.check_available()
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.faults.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.categories.values().cloned().collect())
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        self.faults.check_available()?;
        let tables = self.tables.read().await;
        let products = tables
            .products
            .values()
            .filter(|p| query.category_id.is_none_or(|c| p.category_id == c))
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        self.faults.check_available()?;
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category> {
        self.faults.check_available()?;
        let mut tables = self.tables.write().await;
        tables.last_category_id += 1;
        let created = Category {
            id: CategoryId::new(tables.last_category_id),
            name: category.name,
            description: category.description,
        };
        tables.categories.insert(created.id, created.clone());
        Ok(created)
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        self.faults.check_available()?;
        product.validate()?;

        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&product.category_id) {
            return Err(StoreError::CategoryNotFound(product.category_id));
        }
        tables.last_product_id += 1;
        let created = Product {
            id: ProductId::new(tables.last_product_id),
            category_id: product.category_id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
        };
        tables.products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_orders(&self) -> Result<Vec<OrderDetail>> {
        self.faults.check_available()?;
        let tables = self.tables.read().await;

        let mut records: Vec<&OrderRecord> = tables.orders.values().collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        records
            .into_iter()
            .map(|record| tables.order_detail(record))
            .collect()
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderDetail>> {
        self.faults.check_available()?;
        let tables = self.tables.read().await;
        tables
            .orders
            .get(&id)
            .map(|record| tables.order_detail(record))
            .transpose()
    }
}

/// Write scope over an [`InMemoryStore`].
struct InMemoryTransaction {
    guard: OwnedRwLockWriteGuard<Tables>,
    staged: Tables,
    faults: Arc<Faults>,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderRecord> {
        self.staged.last_order_id += 1;
        let record = OrderRecord {
            id: OrderId::new(self.staged.last_order_id),
            customer_name: order.customer_name.clone(),
            created_at: Utc::now(),
        };
        self.staged.orders.insert(record.id, record.clone());
        Ok(record)
    }

    async fn insert_line(&mut self, order_id: OrderId, line: &NewOrderLine) -> Result<()> {
        if !self.staged.products.contains_key(&line.product_id) {
            return Err(StoreError::ProductNotFound(line.product_id));
        }
        self.staged.lines.push(StoredLine {
            order_id,
            line: line.clone(),
        });
        Ok(())
    }

    async fn decrement_stock(
        &mut self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<StockUpdate> {
        let Some(product) = self.staged.products.get_mut(&product_id) else {
            return Ok(StockUpdate::Missing);
        };
        if product.stock < quantity {
            return Ok(StockUpdate::Insufficient {
                available: product.stock,
            });
        }
        product.stock -= quantity;
        Ok(StockUpdate::Decremented {
            remaining: product.stock,
        })
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if self.faults.fail_on_commit.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "commit rejected by in-memory store".to_string(),
            ));
        }
        let InMemoryTransaction {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
