use std::sync::Arc;

use catalog_core::config::{AppConfig, ConfigError};
use catalog_db::InMemoryProductRepository;
use thiserror::Error;
use tracing::info;

use crate::storage::{StorageError, SupabaseStorage};

pub struct Application {
    pub config: AppConfig,
    pub repository: Arc<InMemoryProductRepository>,
    pub storage: Arc<SupabaseStorage>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("object storage client setup failed: {0}")]
    Storage(#[source] StorageError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let storage = SupabaseStorage::new(&config.storage).map_err(BootstrapError::Storage)?;
    info!(
        event_name = "system.bootstrap.storage_ready",
        correlation_id = "bootstrap",
        bucket = %storage.bucket(),
        "object storage client initialized"
    );

    Ok(Application {
        config,
        repository: Arc::new(InMemoryProductRepository::new()),
        storage: Arc::new(storage),
    })
}

#[cfg(test)]
mod tests {
    use catalog_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use catalog_db::ProductRepository;

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?)
    }

    fn overrides(url: &str, key: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                storage_url: Some(url.to_string()),
                storage_service_role_key: Some(key.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[test]
    fn bootstrap_fails_fast_without_storage_credentials() {
        let result = bootstrap(overrides("https://project.supabase.co", ""));

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("storage.service_role_key"));
    }

    #[tokio::test]
    async fn bootstrap_starts_with_an_empty_catalog() {
        let app = bootstrap(overrides("https://project.supabase.co", "service-role"))
            .expect("bootstrap should succeed with valid overrides");

        assert_eq!(app.repository.count().await, Ok(0));
        assert_eq!(app.storage.bucket(), "products");
        assert_eq!(app.config.storage.base_url(), "https://project.supabase.co");
    }
}
