//! Category and product read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::{CategoryId, ProductId};
use serde::{Deserialize, Serialize};
use store::{Category, Product, ProductQuery, Store};

use super::orders::AppState;
use crate::error::ApiError;

/// Largest page a single product listing may return.
const MAX_PAGE_SIZE: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    pub category_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ProductListParams {
    fn into_query(self) -> Result<ProductQuery, ApiError> {
        let mut query = ProductQuery::new();

        if let Some(raw) = self.category_id.filter(|raw| !raw.trim().is_empty()) {
            let category_id: CategoryId = raw
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("Invalid category_id '{raw}'")))?;
            query = query.category(category_id);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit.min(MAX_PAGE_SIZE));
        }
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }

        Ok(query)
    }
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i32,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            category_id: product.category_id,
            name: product.name,
            description: product.description,
            price: product.price.as_decimal(),
            stock: product.stock,
        }
    }
}

/// GET /categories: list all categories.
#[tracing::instrument(skip(state))]
pub async fn list_categories<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.engine.list_categories().await?))
}

/// GET /products: list products, optionally filtered by `category_id`.
#[tracing::instrument(skip(state))]
pub async fn list_products<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let query = params.into_query()?;
    let products = state.engine.list_products(query).await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// GET /products/:id: load a single product with its current stock.
#[tracing::instrument(skip(state))]
pub async fn get_product<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id: ProductId = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid product id '{id}': {e}")))?;

    let product = state
        .engine
        .get_product(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {product_id} not found")))?;

    Ok(Json(product.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(category_id: Option<&str>) -> ProductListParams {
        ProductListParams {
            category_id: category_id.map(String::from),
            limit: None,
            offset: None,
        }
    }

    #[test]
    fn numeric_category_filter_is_parsed() {
        let query = params(Some("3")).into_query().unwrap();
        assert_eq!(query.category_id, Some(CategoryId::new(3)));
    }

    #[test]
    fn blank_category_filter_is_ignored() {
        let query = params(Some("")).into_query().unwrap();
        assert!(query.category_id.is_none());
    }

    #[test]
    fn injected_category_filter_is_rejected() {
        let result = params(Some("1 OR 1=1")).into_query();
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn page_size_is_capped() {
        let query = ProductListParams {
            category_id: None,
            limit: Some(10_000),
            offset: Some(5),
        }
        .into_query()
        .unwrap();
        assert_eq!(query.limit, Some(MAX_PAGE_SIZE));
        assert_eq!(query.offset, Some(5));
    }
}
