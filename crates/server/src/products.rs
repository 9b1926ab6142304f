//! Product catalog routes.
//!
//! - `POST   /products`: create a product (id assigned by the catalog)
//! - `GET    /products`: list all products in insertion order
//! - `GET    /products/{id}`: fetch one product
//! - `PUT    /products/{id}`: replace every field except the id
//! - `DELETE /products/{id}`: remove a product

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use catalog_core::domain::product::{Product, ProductId, ProductPayload};
use catalog_db::ProductRepository;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;

pub const PRODUCT_DELETED: &str = "Product deleted";

#[derive(Clone)]
pub struct ProductsState {
    repository: Arc<dyn ProductRepository>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductList {
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

pub fn router(repository: Arc<dyn ProductRepository>) -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", get(get_product).put(update_product).delete(delete_product))
        .with_state(ProductsState { repository })
}

async fn create_product(
    State(state): State<ProductsState>,
    payload: Result<Json<ProductPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(payload) = payload
        .map_err(|rejection| ApiError::unprocessable("create_product", rejection.body_text()))?;
    let attributes = payload
        .into_new_product()
        .map_err(|error| ApiError::from_application("create_product", error))?;

    let product = state
        .repository
        .create(attributes)
        .await
        .map_err(|error| ApiError::from_application("create_product", error))?;

    info!(
        event_name = "api.product.created",
        product_id = %product.id,
        name = %product.attributes.name,
        "product created"
    );
    Ok((StatusCode::CREATED, Json(product)))
}

async fn list_products(State(state): State<ProductsState>) -> Result<Json<ProductList>, ApiError> {
    let products = state
        .repository
        .list()
        .await
        .map_err(|error| ApiError::from_application("list_products", error))?;
    Ok(Json(ProductList { products }))
}

async fn get_product(
    State(state): State<ProductsState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    state
        .repository
        .find_by_id(&ProductId(id))
        .await
        .map(Json)
        .map_err(|error| ApiError::from_application("get_product", error))
}

async fn update_product(
    State(state): State<ProductsState>,
    Path(id): Path<String>,
    payload: Result<Json<ProductPayload>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let Json(payload) = payload
        .map_err(|rejection| ApiError::unprocessable("update_product", rejection.body_text()))?;
    let attributes = payload
        .into_replacement()
        .map_err(|error| ApiError::from_application("update_product", error))?;

    let id = ProductId(id);
    let product = state
        .repository
        .replace(&id, attributes)
        .await
        .map_err(|error| ApiError::from_application("update_product", error))?;

    info!(event_name = "api.product.updated", product_id = %id, "product updated");
    Ok(Json(product))
}

async fn delete_product(
    State(state): State<ProductsState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = ProductId(id);
    state
        .repository
        .remove(&id)
        .await
        .map_err(|error| ApiError::from_application("delete_product", error))?;

    info!(event_name = "api.product.deleted", product_id = %id, "product deleted");
    Ok(Json(DeleteResponse { message: PRODUCT_DELETED.to_string() }))
}
