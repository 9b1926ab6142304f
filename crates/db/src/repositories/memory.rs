use tokio::sync::RwLock;
use tracing::debug;

use catalog_core::domain::product::{Product, ProductAttributes, ProductId};

use super::{ProductRepository, RepositoryError};

/// In-process catalog. Records live in insertion order; every mutation holds
/// the write lock for its whole read-modify-write.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn position(products: &[Product], id: &ProductId) -> Option<usize> {
    products.iter().position(|product| &product.id == id)
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, attributes: ProductAttributes) -> Result<Product, RepositoryError> {
        let mut products = self.products.write().await;

        let mut id = ProductId::generate();
        while position(&products, &id).is_some() {
            id = ProductId::generate();
        }

        let product = Product { id, attributes };
        products.push(product.clone());
        debug!(
            event_name = "catalog.product.created",
            product_id = %product.id,
            catalog_size = products.len(),
            "product stored"
        );
        Ok(product)
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.clone())
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        let products = self.products.read().await;
        products
            .iter()
            .find(|product| &product.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))
    }

    async fn replace(
        &self,
        id: &ProductId,
        attributes: ProductAttributes,
    ) -> Result<Product, RepositoryError> {
        let mut products = self.products.write().await;
        let index = position(&products, id).ok_or_else(|| RepositoryError::NotFound(id.clone()))?;

        let slot = &mut products[index];
        slot.attributes = attributes;
        debug!(event_name = "catalog.product.replaced", product_id = %id, "product replaced");
        Ok(slot.clone())
    }

    async fn remove(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        let mut products = self.products.write().await;
        let index = position(&products, id).ok_or_else(|| RepositoryError::NotFound(id.clone()))?;

        let removed = products.remove(index);
        debug!(
            event_name = "catalog.product.removed",
            product_id = %id,
            catalog_size = products.len(),
            "product removed"
        );
        Ok(removed)
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.products.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use serde_json::json;

    use catalog_core::domain::product::{ProductAttributes, ProductId};

    use crate::repositories::{InMemoryProductRepository, ProductRepository, RepositoryError};

    fn attributes(name: &str, price: i64) -> ProductAttributes {
        serde_json::from_value(json!({
            "name": name,
            "category": "phones",
            "brand": "Acme",
            "price": price
        }))
        .expect("attributes fixture")
    }

    #[tokio::test]
    async fn phone_lifecycle_scenario() {
        let repo = InMemoryProductRepository::new();

        let first = repo.create(attributes("Phone A", 100)).await.expect("create first");
        assert_eq!(first.attributes.name, "Phone A");
        assert_eq!(first.attributes.price, Decimal::new(100, 0));

        let second = repo.create(attributes("Phone B", 200)).await.expect("create second");
        assert_ne!(first.id, second.id);

        let found = repo.find_by_id(&first.id).await.expect("find first");
        assert_eq!(found, first);

        repo.replace(&first.id, attributes("Phone A Pro", 150)).await.expect("replace first");
        let updated = repo.find_by_id(&first.id).await.expect("find updated");
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.attributes.name, "Phone A Pro");
        assert_eq!(updated.attributes.price, Decimal::new(150, 0));

        repo.remove(&first.id).await.expect("remove first");
        assert_eq!(
            repo.find_by_id(&first.id).await,
            Err(RepositoryError::NotFound(first.id.clone()))
        );

        let remaining = repo.list().await.expect("list");
        assert_eq!(remaining, vec![second]);
    }

    #[tokio::test]
    async fn created_identifiers_are_unique() {
        let repo = InMemoryProductRepository::new();
        let mut seen = HashSet::new();

        for index in 0..50 {
            let product =
                repo.create(attributes(&format!("Phone {index}"), index)).await.expect("create");
            assert!(seen.insert(product.id), "identifier should not repeat");
        }
    }

    #[tokio::test]
    async fn replace_keeps_position_in_listing() {
        let repo = InMemoryProductRepository::new();
        let a = repo.create(attributes("A", 1)).await.expect("create a");
        let b = repo.create(attributes("B", 2)).await.expect("create b");
        let c = repo.create(attributes("C", 3)).await.expect("create c");

        repo.replace(&b.id, attributes("B2", 20)).await.expect("replace b");

        let ids: Vec<ProductId> =
            repo.list().await.expect("list").into_iter().map(|product| product.id).collect();
        assert_eq!(ids, vec![a.id, b.id, c.id]);
    }

    #[tokio::test]
    async fn remove_shifts_later_records_without_renumbering() {
        let repo = InMemoryProductRepository::new();
        let a = repo.create(attributes("A", 1)).await.expect("create a");
        let b = repo.create(attributes("B", 2)).await.expect("create b");
        let c = repo.create(attributes("C", 3)).await.expect("create c");

        let removed = repo.remove(&a.id).await.expect("remove a");
        assert_eq!(removed, a);

        let listed = repo.list().await.expect("list");
        assert_eq!(listed, vec![b.clone(), c.clone()]);
        assert_eq!(repo.find_by_id(&c.id).await.expect("find c"), c);
    }

    #[tokio::test]
    async fn missing_identifier_is_not_found_for_every_lookup() {
        let repo = InMemoryProductRepository::new();
        repo.create(attributes("A", 1)).await.expect("create a");
        let missing = ProductId("missing".to_string());
        let expected = Err(RepositoryError::NotFound(missing.clone()));

        assert_eq!(repo.find_by_id(&missing).await, expected);
        assert_eq!(repo.replace(&missing, attributes("X", 1)).await, expected);
        assert_eq!(repo.remove(&missing).await, expected);
        assert_eq!(repo.count().await, Ok(1));
    }

    #[tokio::test]
    async fn count_tracks_creates_minus_removes() {
        let repo = InMemoryProductRepository::new();
        let mut created = Vec::new();
        for index in 0..5 {
            created.push(repo.create(attributes("P", index)).await.expect("create"));
        }
        repo.remove(&created[1].id).await.expect("remove");
        repo.remove(&created[3].id).await.expect("remove");

        assert_eq!(repo.count().await, Ok(3));
        assert_eq!(repo.list().await.expect("list").len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_do_not_lose_records() {
        let repo = Arc::new(InMemoryProductRepository::new());
        let mut handles = Vec::new();

        for index in 0..32 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.create(attributes("Concurrent", index)).await.expect("create")
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            let product = handle.await.expect("task joined");
            ids.insert(product.id);
        }

        assert_eq!(ids.len(), 32);
        assert_eq!(repo.count().await, Ok(32));
    }
}
