//! Integration tests for the order engine.
//!
//! These tests verify atomic order placement, stock conservation, read
//! ordering and concurrent decrement safety against the in-memory store.

use std::sync::Arc;

use common::{Money, ProductId};
use engine::{ErrorKind, LineItemRequest, OrderEngine, OrderError, PlaceOrder};
use store::{InMemoryStore, NewCategory, NewProduct, Product, Store};

/// Helper to create an engine over a store seeded with products of the given stock levels
async fn create_engine(stocks: &[i32]) -> (OrderEngine<InMemoryStore>, Vec<Product>) {
    let store = InMemoryStore::new();
    let category = store
        .create_category(NewCategory::new("Hardware", "Tools and parts"))
        .await
        .unwrap();

    let mut products = Vec::new();
    for (i, stock) in stocks.iter().enumerate() {
        let product = store
            .create_product(
                NewProduct::new(
                    category.id,
                    format!("Product {}", i + 1),
                    Money::from_cents(999),
                    *stock,
                )
                .with_description("test product"),
            )
            .await
            .unwrap();
        products.push(product);
    }

    (OrderEngine::new(store), products)
}

async fn stock_of(engine: &OrderEngine<InMemoryStore>, product_id: ProductId) -> i32 {
    engine
        .get_product(product_id)
        .await
        .unwrap()
        .unwrap()
        .stock
}

mod place_order {
    use super::*;

    #[tokio::test]
    async fn alice_buys_four_units() {
        let (engine, products) = create_engine(&[10]).await;
        let product = &products[0];

        let order_id = engine
            .place_order(PlaceOrder::new(
                "Alice",
                vec![LineItemRequest::new(
                    product.id,
                    4,
                    Money::from_decimal(9.99).unwrap(),
                )],
            ))
            .await
            .unwrap();

        assert_eq!(stock_of(&engine, product.id).await, 6);

        let orders = engine.list_orders().await.unwrap();
        assert_eq!(orders[0].id, order_id);
        assert_eq!(orders[0].customer_name, "Alice");
        assert_eq!(orders[0].items.len(), 1);

        let item = &orders[0].items[0];
        assert_eq!(item.product_id, product.id);
        assert_eq!(item.quantity, 4);
        assert_eq!(item.price.as_decimal(), 9.99);
        assert_eq!(item.product_name, "Product 1");
    }

    #[tokio::test]
    async fn bob_orders_missing_product() {
        let (engine, products) = create_engine(&[10]).await;

        let err = engine
            .place_order(PlaceOrder::new("Bob", vec![]).with_item(
                ProductId::new(999),
                1,
                Money::from_cents(100),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::ProductNotFound(id) if id == ProductId::new(999)));
        assert!(engine.list_orders().await.unwrap().is_empty());
        assert_eq!(stock_of(&engine, products[0].id).await, 10);
    }

    #[tokio::test]
    async fn multi_item_order_decrements_each_product() {
        let (engine, products) = create_engine(&[10, 5, 7]).await;

        let cmd = PlaceOrder::new("Carol", vec![])
            .with_item(products[0].id, 3, Money::from_cents(999))
            .with_item(products[1].id, 5, Money::from_cents(500))
            .with_item(products[2].id, 1, Money::from_cents(250));
        let order_id = engine.place_order(cmd).await.unwrap();

        assert_eq!(stock_of(&engine, products[0].id).await, 7);
        assert_eq!(stock_of(&engine, products[1].id).await, 0);
        assert_eq!(stock_of(&engine, products[2].id).await, 6);

        let order = engine.get_order(order_id).await.unwrap().unwrap();
        let quantities: Vec<_> = order.items.iter().map(|i| i.quantity).collect();
        assert_eq!(quantities, vec![3, 5, 1]);
        assert_eq!(order.total().cents(), 3 * 999 + 5 * 500 + 250);
    }

    #[tokio::test]
    async fn repeated_product_lines_accumulate() {
        let (engine, products) = create_engine(&[5]).await;

        let cmd = PlaceOrder::new("Dan", vec![])
            .with_item(products[0].id, 2, Money::from_cents(999))
            .with_item(products[0].id, 3, Money::from_cents(999));
        engine.place_order(cmd).await.unwrap();
        assert_eq!(stock_of(&engine, products[0].id).await, 0);

        let cmd = PlaceOrder::new("Dan", vec![])
            .with_item(products[0].id, 1, Money::from_cents(999));
        let err = engine.place_order(cmd).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    }

    #[tokio::test]
    async fn price_is_snapshotted_from_request() {
        let (engine, products) = create_engine(&[5]).await;

        let order_id = engine
            .place_order(PlaceOrder::new("Eve", vec![]).with_item(
                products[0].id,
                1,
                Money::from_cents(123),
            ))
            .await
            .unwrap();

        let order = engine.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.items[0].price, Money::from_cents(123));
        assert_ne!(order.items[0].price, products[0].price);
    }
}

mod atomicity {
    use super::*;

    #[tokio::test]
    async fn missing_product_in_later_line_rolls_back_everything() {
        let (engine, products) = create_engine(&[10, 10]).await;

        let cmd = PlaceOrder::new("Frank", vec![])
            .with_item(products[0].id, 2, Money::from_cents(999))
            .with_item(products[1].id, 3, Money::from_cents(999))
            .with_item(ProductId::new(404), 1, Money::from_cents(999));
        let err = engine.place_order(cmd).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ProductNotFound);
        assert_eq!(engine.store().order_count().await, 0);
        assert_eq!(engine.store().line_count().await, 0);
        assert_eq!(stock_of(&engine, products[0].id).await, 10);
        assert_eq!(stock_of(&engine, products[1].id).await, 10);
    }

    #[tokio::test]
    async fn oversell_in_later_line_rolls_back_everything() {
        let (engine, products) = create_engine(&[10, 1]).await;

        let cmd = PlaceOrder::new("Grace", vec![])
            .with_item(products[0].id, 4, Money::from_cents(999))
            .with_item(products[1].id, 2, Money::from_cents(999));
        let err = engine.place_order(cmd).await.unwrap_err();

        match err {
            OrderError::InsufficientStock {
                product_id,
                requested,
                available,
            } => {
                assert_eq!(product_id, products[1].id);
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(engine.store().order_count().await, 0);
        assert_eq!(stock_of(&engine, products[0].id).await, 10);
        assert_eq!(stock_of(&engine, products[1].id).await, 1);
    }

    #[tokio::test]
    async fn failed_commit_is_transaction_aborted() {
        let (engine, products) = create_engine(&[10]).await;
        engine.store().set_fail_on_commit(true);

        let err = engine
            .place_order(PlaceOrder::new("Heidi", vec![]).with_item(
                products[0].id,
                1,
                Money::from_cents(999),
            ))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransactionAborted);
        engine.store().set_fail_on_commit(false);
        assert_eq!(engine.store().order_count().await, 0);
        assert_eq!(stock_of(&engine, products[0].id).await, 10);
    }

    #[tokio::test]
    async fn unavailable_store_is_store_unavailable() {
        let (engine, products) = create_engine(&[10]).await;
        engine.store().set_unavailable(true);

        let err = engine
            .place_order(PlaceOrder::new("Ivan", vec![]).with_item(
                products[0].id,
                1,
                Money::from_cents(999),
            ))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);

        let err = engine.list_orders().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    }

    #[tokio::test]
    async fn engine_is_usable_after_failure() {
        let (engine, products) = create_engine(&[3]).await;

        let too_many = PlaceOrder::new("Judy", vec![]).with_item(
            products[0].id,
            4,
            Money::from_cents(999),
        );
        assert!(engine.place_order(too_many).await.is_err());

        let ok = PlaceOrder::new("Judy", vec![]).with_item(
            products[0].id,
            3,
            Money::from_cents(999),
        );
        assert!(engine.place_order(ok).await.is_ok());
        assert_eq!(stock_of(&engine, products[0].id).await, 0);
    }
}

mod reads {
    use super::*;

    #[tokio::test]
    async fn newest_order_is_listed_first() {
        let (engine, products) = create_engine(&[100]).await;

        let mut ids = Vec::new();
        for name in ["one", "two", "three"] {
            let id = engine
                .place_order(PlaceOrder::new(name, vec![]).with_item(
                    products[0].id,
                    1,
                    Money::from_cents(999),
                ))
                .await
                .unwrap();
            ids.push(id);

            let orders = engine.list_orders().await.unwrap();
            assert_eq!(orders[0].id, id);
        }

        let orders = engine.list_orders().await.unwrap();
        let listed: Vec<_> = orders.iter().map(|o| o.id).collect();
        ids.reverse();
        assert_eq!(listed, ids);
        assert!(
            orders
                .windows(2)
                .all(|pair| pair[0].created_at >= pair[1].created_at)
        );
    }

    #[tokio::test]
    async fn every_order_carries_exactly_its_lines() {
        let (engine, products) = create_engine(&[100, 100]).await;

        for lines in 1..=4 {
            let mut cmd = PlaceOrder::new(format!("customer-{lines}"), vec![]);
            for i in 0..lines {
                cmd = cmd.with_item(products[i % 2].id, 1, Money::from_cents(999));
            }
            engine.place_order(cmd).await.unwrap();
        }

        let orders = engine.list_orders().await.unwrap();
        let counts: Vec<_> = orders.iter().map(|o| o.items.len()).collect();
        assert_eq!(counts, vec![4, 3, 2, 1]);
        assert_eq!(engine.store().line_count().await, 10);
    }

    #[tokio::test]
    async fn get_unknown_order_is_none() {
        let (engine, _) = create_engine(&[1]).await;
        let order = engine.get_order(common::OrderId::new(77)).await.unwrap();
        assert!(order.is_none());
    }
}

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn two_orders_competing_for_five_units() {
        let (engine, products) = create_engine(&[5]).await;
        let engine = Arc::new(engine);
        let product_id = products[0].id;

        let handles: Vec<_> = ["Ann", "Ben"]
            .into_iter()
            .map(|name| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine
                        .place_order(PlaceOrder::new(name, vec![]).with_item(
                            product_id,
                            3,
                            Money::from_cents(999),
                        ))
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        let mut failures = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(err) => failures.push(err),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind(), ErrorKind::InsufficientStock);
        assert_eq!(stock_of(&engine, product_id).await, 2);
        assert_eq!(engine.list_orders().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn stock_is_conserved_under_contention() {
        let (engine, products) = create_engine(&[10]).await;
        let engine = Arc::new(engine);
        let product_id = products[0].id;

        let handles: Vec<_> = (0..25)
            .map(|i| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine
                        .place_order(PlaceOrder::new(format!("buyer-{i}"), vec![]).with_item(
                            product_id,
                            1,
                            Money::from_cents(999),
                        ))
                        .await
                })
            })
            .collect();

        let mut placed = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                placed += 1;
            }
        }

        assert_eq!(placed, 10);
        assert_eq!(stock_of(&engine, product_id).await, 0);
        assert_eq!(engine.list_orders().await.unwrap().len(), 10);
    }
}
