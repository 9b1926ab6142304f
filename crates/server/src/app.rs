use std::sync::Arc;

use axum::Router;
use catalog_db::ProductRepository;
use tower_http::trace::TraceLayer;

use crate::storage::ObjectStorage;
use crate::{health, products, upload};

/// Full HTTP surface: catalog routes, image upload passthrough and health.
pub fn router(repository: Arc<dyn ProductRepository>, storage: Arc<dyn ObjectStorage>) -> Router {
    Router::new()
        .merge(products::router(Arc::clone(&repository)))
        .merge(upload::router(storage))
        .merge(health::router(repository))
        .layer(TraceLayer::new_for_http())
}
