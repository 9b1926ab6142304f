//! Object storage client for product images.
//!
//! Speaks the Supabase Storage REST API:
//! - `POST {url}/storage/v1/object/{bucket}/{name}`: upload bytes
//! - `GET  {url}/storage/v1/object/public/{bucket}/{name}`: public read URL

use std::time::Duration;

use async_trait::async_trait;
use catalog_core::config::{StorageConfig, StorageEndpoint};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage url `{0}`")]
    InvalidUrl(String),
    #[error("storage client could not be built: {0}")]
    Client(#[source] reqwest::Error),
    #[error("storage request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("storage responded with {status}: {body}")]
    Upstream { status: u16, body: String },
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    fn public_url(&self, object_name: &str) -> String;
}

pub struct SupabaseStorage {
    client: Client,
    endpoint: StorageEndpoint,
    bucket: String,
    service_role_key: SecretString,
}

impl SupabaseStorage {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let endpoint =
            config.endpoint().map_err(|_| StorageError::InvalidUrl(config.url.clone()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(StorageError::Client)?;

        Ok(Self {
            client,
            endpoint,
            bucket: config.bucket.trim().to_string(),
            service_role_key: config.service_role_key.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let url = self.endpoint.object_url(&self.bucket, object_name);
        let key = self.service_role_key.expose_secret();
        let size = bytes.len();

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {key}"))
            .header("apikey", key)
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|error| {
                error!(
                    event_name = "storage.upload.transport_error",
                    bucket = %self.bucket,
                    object_name = %object_name,
                    error = %error,
                    "object upload request failed"
                );
                StorageError::Transport(error)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                event_name = "storage.upload.rejected",
                bucket = %self.bucket,
                object_name = %object_name,
                status = status.as_u16(),
                "object storage rejected upload"
            );
            return Err(StorageError::Upstream { status: status.as_u16(), body });
        }

        info!(
            event_name = "storage.upload.completed",
            bucket = %self.bucket,
            object_name = %object_name,
            size_bytes = size,
            "object uploaded"
        );
        Ok(())
    }

    fn public_url(&self, object_name: &str) -> String {
        self.endpoint.public_object_url(&self.bucket, object_name).into()
    }
}
