use async_trait::async_trait;
use thiserror::Error;

use catalog_core::domain::product::{Product, ProductAttributes, ProductId};
use catalog_core::errors::ApplicationError;

pub mod memory;

pub use memory::InMemoryProductRepository;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("product `{0}` not found")]
    NotFound(ProductId),
    /// The backing store could not serve the request at all.
    #[error("catalog store unavailable: {0}")]
    Unavailable(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound(id) => Self::NotFound(id),
            RepositoryError::Unavailable(reason) => Self::Upstream(reason),
        }
    }
}

/// The catalog store contract. Implementations own the identifier: `create`
/// always assigns one and `replace` never changes it.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create(&self, attributes: ProductAttributes) -> Result<Product, RepositoryError>;

    /// All products in insertion order.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn find_by_id(&self, id: &ProductId) -> Result<Product, RepositoryError>;

    async fn replace(
        &self,
        id: &ProductId,
        attributes: ProductAttributes,
    ) -> Result<Product, RepositoryError>;

    /// Removes the product and hands it back.
    async fn remove(&self, id: &ProductId) -> Result<Product, RepositoryError>;

    async fn count(&self) -> Result<usize, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use catalog_core::domain::product::ProductId;
    use catalog_core::errors::ApplicationError;

    use super::RepositoryError;

    #[test]
    fn repository_errors_map_to_application_errors() {
        let missing = ApplicationError::from(RepositoryError::NotFound(ProductId("p-1".into())));
        assert_eq!(missing, ApplicationError::NotFound(ProductId("p-1".into())));

        let unavailable =
            ApplicationError::from(RepositoryError::Unavailable("connection reset".into()));
        assert_eq!(unavailable, ApplicationError::Upstream("connection reset".into()));
    }
}
