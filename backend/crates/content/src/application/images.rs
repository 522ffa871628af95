//! Images Use Case
//!
//! Admin image upload/remove on top of the configured object storage.

use std::sync::Arc;

use platform::storage::{ObjectStorage, StoredObject, generate_key, validate_key};

use crate::application::config::ContentConfig;
use crate::error::ContentResult;

pub struct ImagesUseCase<S>
where
    S: ObjectStorage + Sync,
{
    storage: Arc<S>,
    config: Arc<ContentConfig>,
}

impl<S> ImagesUseCase<S>
where
    S: ObjectStorage + Sync,
{
    pub fn new(storage: Arc<S>, config: Arc<ContentConfig>) -> Self {
        Self { storage, config }
    }

    /// Store under a fresh key and return its public URL
    pub async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> ContentResult<StoredObject> {
        let result: ContentResult<StoredObject> = async {
            let key = generate_key(&self.config.image_prefix, content_type)?;
            Ok(self.storage.upload(&key, bytes, content_type).await?)
        }
        .await;

        result
            .inspect(|o| tracing::info!(key = %o.key, size = o.size, "Image uploaded"))
            .inspect_err(|e| e.log("upload_image"))
    }

    pub async fn remove(&self, key: &str) -> ContentResult<()> {
        let result: ContentResult<()> = async {
            validate_key(key)?;
            Ok(self.storage.remove(key).await?)
        }
        .await;

        result
            .inspect(|()| tracing::info!(key = %key, "Image removed"))
            .inspect_err(|e| e.log("remove_image"))
    }
}
