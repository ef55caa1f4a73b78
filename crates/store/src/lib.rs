//! Catalog and order persistence.
//!
//! [`Store`] covers catalog reads, catalog seeding and order reads.
//! Order placement writes go through a [`StoreTransaction`] so that the order
//! header, its lines and the matching stock decrements commit together.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::{CategoryId, Money, OrderId, ProductId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{
    Category, NewCategory, NewOrder, NewOrderLine, NewProduct, OrderDetail, OrderLineDetail,
    OrderRecord, Product, StockUpdate,
};
pub use postgres::PostgresStore;
pub use query::ProductQuery;
pub use store::{Store, StoreTransaction};
