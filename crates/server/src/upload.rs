use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use catalog_core::errors::ApplicationError;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::storage::ObjectStorage;

const UPLOAD_FIELD: &str = "file";
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Clone)]
pub struct UploadState {
    storage: Arc<dyn ObjectStorage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    pub url: String,
}

pub fn router(storage: Arc<dyn ObjectStorage>) -> Router {
    Router::new()
        .route("/upload-image", post(upload_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(UploadState { storage })
}

/// Object name for an upload: a fresh token followed by the client's file
/// name with any directory part removed.
fn object_name(original: Option<&str>) -> String {
    let base = original
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("upload");
    format!("{}-{base}", Uuid::new_v4())
}

async fn upload_image(
    State(state): State<UploadState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| ApiError::from_multipart("upload_image", error))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = object_name(field.file_name());
        let content_type = field.content_type().unwrap_or(FALLBACK_CONTENT_TYPE).to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|error| ApiError::from_multipart("upload_image", error))?;

        state
            .storage
            .upload(&filename, bytes.to_vec(), &content_type)
            .await
            .map_err(|error| {
                ApiError::from_application(
                    "upload_image",
                    ApplicationError::Upstream(error.to_string()),
                )
            })?;
        let url = state.storage.public_url(&filename);

        info!(
            event_name = "api.image.uploaded",
            filename = %filename,
            content_type = %content_type,
            size_bytes = bytes.len(),
            "image uploaded"
        );
        return Ok(Json(UploadResponse { filename, url }));
    }

    Err(ApiError::unprocessable("upload_image", "multipart field `file` is required"))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    use super::{object_name, router, UploadResponse, MAX_UPLOAD_BYTES};
    use crate::error::ErrorBody;
    use crate::storage::{ObjectStorage, StorageError};

    const BOUNDARY: &str = "catalog-test-boundary";

    #[derive(Default)]
    struct RecordingStorage {
        fail_with: Option<u16>,
        uploads: Mutex<Vec<(String, Vec<u8>, String)>>,
    }

    #[async_trait]
    impl ObjectStorage for RecordingStorage {
        async fn upload(
            &self,
            object_name: &str,
            bytes: Vec<u8>,
            content_type: &str,
        ) -> Result<(), StorageError> {
            if let Some(status) = self.fail_with {
                return Err(StorageError::Upstream { status, body: "bucket not found".to_string() });
            }
            self.uploads.lock().expect("uploads lock").push((
                object_name.to_string(),
                bytes,
                content_type.to_string(),
            ));
            Ok(())
        }

        fn public_url(&self, object_name: &str) -> String {
            format!("https://cdn.test/public/products/{object_name}")
        }
    }

    fn multipart_body(field: &str, filename: &str, content: &str) -> String {
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: image/png\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        )
    }

    async fn post_upload<T: DeserializeOwned>(
        storage: Arc<RecordingStorage>,
        body: String,
    ) -> (StatusCode, T) {
        let request = Request::builder()
            .method("POST")
            .uri("/upload-image")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .expect("request");

        let response = router(storage).oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn upload_forwards_bytes_and_returns_public_url() {
        let storage = Arc::new(RecordingStorage::default());

        let (status, response): (_, UploadResponse) = post_upload(
            Arc::clone(&storage),
            multipart_body("file", "front.png", "PNGDATA"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(response.filename.ends_with("-front.png"));
        assert_eq!(response.url, format!("https://cdn.test/public/products/{}", response.filename));

        let uploads = storage.uploads.lock().expect("uploads lock");
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, response.filename);
        assert_eq!(uploads[0].1, b"PNGDATA".to_vec());
        assert_eq!(uploads[0].2, "image/png");
    }

    #[tokio::test]
    async fn upstream_failure_is_reported_as_server_error() {
        let storage = Arc::new(RecordingStorage { fail_with: Some(404), ..Default::default() });

        let (status, error): (_, ErrorBody) =
            post_upload(storage, multipart_body("file", "front.png", "PNGDATA")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error.detail.contains("bucket not found"));
    }

    #[tokio::test]
    async fn missing_file_field_is_unprocessable() {
        let storage = Arc::new(RecordingStorage::default());

        let (status, error): (_, ErrorBody) = post_upload(
            Arc::clone(&storage),
            multipart_body("image", "front.png", "PNGDATA"),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(error.detail.contains("`file`"));
        assert!(storage.uploads.lock().expect("uploads lock").is_empty());
    }

    #[tokio::test]
    async fn oversized_upload_is_payload_too_large() {
        let storage = Arc::new(RecordingStorage::default());
        let content = "x".repeat(MAX_UPLOAD_BYTES + 1024 * 1024);

        let (status, error): (_, ErrorBody) =
            post_upload(Arc::clone(&storage), multipart_body("file", "huge.png", &content)).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(!error.detail.is_empty());
        assert!(storage.uploads.lock().expect("uploads lock").is_empty());
    }

    #[test]
    fn object_names_are_unique_and_strip_directories() {
        let first = object_name(Some("../../etc/front.png"));
        let second = object_name(Some("front.png"));

        assert!(first.ends_with("-front.png"));
        assert!(!first.contains('/'));
        assert_ne!(first, second);
        assert!(object_name(None).ends_with("-upload"));
    }
}
