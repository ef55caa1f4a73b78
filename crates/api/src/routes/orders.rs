//! Order placement and order read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId};
use engine::{LineItemRequest, OrderEngine, OrderError, PlaceOrder};
use serde::{Deserialize, Serialize};
use store::{OrderDetail, Store};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub engine: OrderEngine<S>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_name: String,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price in currency units, e.g. `9.99`.
    pub price: f64,
}

impl PlaceOrderRequest {
    fn into_command(self) -> Result<PlaceOrder, OrderError> {
        let items = self
            .items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let price = Money::from_decimal(item.price).map_err(|e| {
                    OrderError::invalid_item(format!(
                        "item {index} (product {}): {e}",
                        item.product_id
                    ))
                })?;
                Ok(LineItemRequest::new(item.product_id, item.quantity, price))
            })
            .collect::<Result<Vec<_>, OrderError>>()?;

        Ok(PlaceOrder::new(self.customer_name, items))
    }
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub order_id: OrderId,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
    pub total: f64,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: f64,
    pub product_name: String,
}

impl From<OrderDetail> for OrderResponse {
    fn from(order: OrderDetail) -> Self {
        let total = order.total().as_decimal();
        Self {
            id: order.id,
            customer_name: order.customer_name,
            created_at: order.created_at,
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price.as_decimal(),
                    product_name: item.product_name,
                })
                .collect(),
            total,
        }
    }
}

// -- Handlers --

/// POST /orders: place an order and decrement stock atomically.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let Json(req) = payload?;
    let cmd = req.into_command()?;
    let order_id = state.engine.place_order(cmd).await?;

    Ok((StatusCode::CREATED, Json(OrderCreatedResponse { order_id })))
}

/// GET /orders: list all orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.engine.list_orders().await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /orders/:id: load a single order.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id '{id}': {e}")))?;

    let order = state
        .engine
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {order_id} not found")))?;

    Ok(Json(order.into()))
}
