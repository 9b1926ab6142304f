use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use catalog_db::ProductRepository;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct HealthState {
    repository: Arc<dyn ProductRepository>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: HealthCheck,
    pub catalog: HealthCheck,
    pub checked_at: String,
}

pub fn router(repository: Arc<dyn ProductRepository>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { repository })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = catalog_check(state.repository.as_ref()).await;
    let ready = catalog.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" }.to_string(),
        service: HealthCheck {
            status: "ready".to_string(),
            detail: "catalog-server runtime initialized".to_string(),
        },
        catalog,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn catalog_check(repository: &dyn ProductRepository) -> HealthCheck {
    match repository.count().await {
        Ok(count) => {
            HealthCheck { status: "ready".to_string(), detail: format!("{count} products stored") }
        }
        Err(error) => HealthCheck {
            status: "degraded".to_string(),
            detail: format!("catalog query failed: {error}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, Json};
    use catalog_core::domain::product::{Product, ProductAttributes, ProductId};
    use catalog_db::{InMemoryProductRepository, ProductRepository, RepositoryError};
    use serde_json::json;

    use crate::health::{health, HealthState};

    struct BrokenRepository;

    #[async_trait]
    impl ProductRepository for BrokenRepository {
        async fn create(&self, _: ProductAttributes) -> Result<Product, RepositoryError> {
            Err(unavailable())
        }

        async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
            Err(unavailable())
        }

        async fn find_by_id(&self, id: &ProductId) -> Result<Product, RepositoryError> {
            Err(RepositoryError::NotFound(id.clone()))
        }

        async fn replace(
            &self,
            id: &ProductId,
            _: ProductAttributes,
        ) -> Result<Product, RepositoryError> {
            Err(RepositoryError::NotFound(id.clone()))
        }

        async fn remove(&self, id: &ProductId) -> Result<Product, RepositoryError> {
            Err(RepositoryError::NotFound(id.clone()))
        }

        async fn count(&self) -> Result<usize, RepositoryError> {
            Err(unavailable())
        }
    }

    fn unavailable() -> RepositoryError {
        RepositoryError::Unavailable("store offline".to_string())
    }

    #[tokio::test]
    async fn health_reports_catalog_size() {
        let repository = Arc::new(InMemoryProductRepository::new());
        let attributes: ProductAttributes = serde_json::from_value(json!({
            "name": "Phone A",
            "category": "phones",
            "brand": "Acme",
            "price": 100
        }))
        .expect("attributes");
        repository.create(attributes).await.expect("create");

        let (status, Json(payload)) = health(State(HealthState { repository })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.catalog.detail, "1 products stored");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_catalog_fails() {
        let (status, Json(payload)) =
            health(State(HealthState { repository: Arc::new(BrokenRepository) })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.catalog.status, "degraded");
        assert!(payload.catalog.detail.contains("store offline"));
    }
}
