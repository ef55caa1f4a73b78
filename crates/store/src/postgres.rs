use std::collections::HashMap;

use async_trait::async_trait;
use common::{CategoryId, Money, OrderId, ProductId};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    Category, NewCategory, NewOrder, NewOrderLine, NewProduct, OrderDetail, OrderLineDetail,
    OrderRecord, Product, ProductQuery, Result, StockUpdate, StoreError,
    store::{Store, StoreTransaction},
};

const PRODUCT_COLUMNS: &str = "id, category_id, name, description, price, stock";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_category(row: PgRow) -> Result<Category> {
        Ok(Category {
            id: CategoryId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            category_id: CategoryId::new(row.try_get("category_id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price")?),
            stock: row.try_get("stock")?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<OrderRecord> {
        Ok(OrderRecord {
            id: OrderId::new(row.try_get("id")?),
            customer_name: row.try_get("customer_name")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_line(row: &PgRow) -> Result<(OrderId, OrderLineDetail)> {
        let order_id = OrderId::new(row.try_get("order_id")?);
        let line = OrderLineDetail {
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity: row.try_get("quantity")?,
            price: Money::from_cents(row.try_get("price")?),
            product_name: row.try_get("product_name")?,
        };
        Ok((order_id, line))
    }

    /// Opens a read-only snapshot so headers and lines come from the same
    /// point in time.
    async fn begin_snapshot(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    fn assemble(records: Vec<OrderRecord>, lines: Vec<(OrderId, OrderLineDetail)>) -> Vec<OrderDetail> {
        let mut grouped: HashMap<OrderId, Vec<OrderLineDetail>> = HashMap::new();
        for (order_id, line) in lines {
            grouped.entry(order_id).or_default().push(line);
        }

        records
            .into_iter()
            .map(|record| {
                let items = grouped.remove(&record.id).unwrap_or_default();
                OrderDetail::from_record(record, items)
            })
            .collect()
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTransaction { tx }))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name, description FROM categories ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_category).collect()
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let mut sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1");
        let mut param_count = 0;

        if query.category_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND category_id = ${param_count}"));
        }

        sql.push_str(" ORDER BY id ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(category_id) = query.category_id {
            sqlx_query = sqlx_query.bind(category_id.as_i64());
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(i64::try_from(offset).unwrap_or(i64::MAX));
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row: Option<PgRow> = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category> {
        let row = sqlx::query(
            r#"
            INSERT INTO categories (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description
            "#,
        )
        .bind(&category.name)
        .bind(&category.description)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_category(row)
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        product.validate()?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (category_id, name, description, price, stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.category_id.as_i64())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.stock)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("products_category_fk")
            {
                return StoreError::CategoryNotFound(product.category_id);
            }
            StoreError::Database(e)
        })?;

        Self::row_to_product(row)
    }

    async fn list_orders(&self) -> Result<Vec<OrderDetail>> {
        let mut tx = self.begin_snapshot().await?;

        let order_rows = sqlx::query(
            r#"
            SELECT id, customer_name, created_at
            FROM orders
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let line_rows = sqlx::query(
            r#"
            SELECT oi.order_id, oi.product_id, oi.quantity, oi.price, p.name AS product_name
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            ORDER BY oi.order_id ASC, oi.id ASC
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let records = order_rows
            .iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        let lines = line_rows
            .iter()
            .map(Self::row_to_line)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::assemble(records, lines))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderDetail>> {
        let mut tx = self.begin_snapshot().await?;

        let order_row: Option<PgRow> =
            sqlx::query("SELECT id, customer_name, created_at FROM orders WHERE id = $1")
                .bind(id.as_i64())
                .fetch_optional(&mut *tx)
                .await?;

        let Some(order_row) = order_row else {
            tx.commit().await?;
            return Ok(None);
        };

        let line_rows = sqlx::query(
            r#"
            SELECT oi.order_id, oi.product_id, oi.quantity, oi.price, p.name AS product_name
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id ASC
            "#,
        )
        .bind(id.as_i64())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let record = Self::row_to_order(&order_row)?;
        let lines = line_rows
            .iter()
            .map(Self::row_to_line)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::assemble(vec![record], lines).pop())
    }
}

/// Write scope over a pooled connection. Rolls back on drop unless committed.
struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO orders (customer_name)
            VALUES ($1)
            RETURNING id, customer_name, created_at
            "#,
        )
        .bind(&order.customer_name)
        .fetch_one(&mut *self.tx)
        .await?;

        PostgresStore::row_to_order(&row)
    }

    async fn insert_line(&mut self, order_id: OrderId, line: &NewOrderLine) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order_id.as_i64())
        .bind(line.product_id.as_i64())
        .bind(line.quantity)
        .bind(line.price.cents())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("order_items_product_fk")
            {
                return StoreError::ProductNotFound(line.product_id);
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn decrement_stock(
        &mut self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<StockUpdate> {
        // The predicate is re-checked after the row lock is taken, so two
        // concurrent decrements can never both pass on the same units.
        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - $1
            WHERE id = $2 AND stock >= $1
            RETURNING stock
            "#,
        )
        .bind(quantity)
        .bind(product_id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?;

        if let Some(remaining) = remaining {
            return Ok(StockUpdate::Decremented { remaining });
        }

        let available: Option<i32> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(product_id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(match available {
            Some(available) => StockUpdate::Insufficient { available },
            None => StockUpdate::Missing,
        })
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
