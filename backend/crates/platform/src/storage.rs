//! Object Storage
//!
//! Upload / remove / public-URL resolution for admin image uploads.
//! `LocalDiskStorage` writes under a root directory served at a public base
//! URL; `NoopStorage` is used when no upload directory is configured.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Maximum accepted object size (5 MiB)
pub const MAX_OBJECT_BYTES: usize = 5 * 1024 * 1024;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Object is too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object storage is not configured")]
    Disabled,

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored object and where the public can fetch it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub public_url: String,
    pub size: usize,
}

/// Object storage backend
#[trait_variant::make(ObjectStorage: Send)]
pub trait LocalObjectStorage {
    /// Store `bytes` under `key`, replacing any existing object
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<StoredObject>;

    /// Remove the object stored under `key`
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Resolve the public URL of `key`
    fn public_url(&self, key: &str) -> StorageResult<String>;
}

/// File extension for the accepted image content types
pub fn image_extension(content_type: &str) -> StorageResult<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/webp" => Ok("webp"),
        "image/gif" => Ok("gif"),
        _ => Err(StorageError::UnsupportedContentType(content_type.to_string())),
    }
}

/// Fresh key `{prefix}/{uuid}.{ext}` for an upload
pub fn generate_key(prefix: &str, content_type: &str) -> StorageResult<String> {
    let ext = image_extension(content_type)?;
    let key = format!("{}/{}.{}", prefix.trim_matches('/'), Uuid::new_v4(), ext);
    validate_key(&key)?;
    Ok(key)
}

/// Keys are relative, `/`-separated, made of `[A-Za-z0-9._-]` segments
pub fn validate_key(key: &str) -> StorageResult<()> {
    let invalid = || StorageError::InvalidKey(key.to_string());

    if key.is_empty() || key.len() > 255 || key.starts_with('/') {
        return Err(invalid());
    }
    for segment in key.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(invalid());
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(invalid());
        }
    }
    // Only plain relative components may reach the filesystem
    if Path::new(key)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(invalid());
    }
    Ok(())
}

// ============================================================================
// Local disk
// ============================================================================

#[derive(Debug, Clone)]
pub struct LocalDiskStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl ObjectStorage for LocalDiskStorage {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<StoredObject> {
        image_extension(content_type)?;
        if bytes.len() > MAX_OBJECT_BYTES {
            return Err(StorageError::TooLarge {
                size: bytes.len(),
                max: MAX_OBJECT_BYTES,
            });
        }

        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let size = bytes.len();
        tokio::fs::write(&path, bytes).await?;

        tracing::info!(key = %key, size, "Object stored");

        Ok(StoredObject {
            key: key.to_string(),
            public_url: ObjectStorage::public_url(self, key)?,
            size,
        })
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(key = %key, "Object removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, key: &str) -> StorageResult<String> {
        validate_key(key)?;
        Ok(format!("{}/{}", self.public_base_url, key))
    }
}

// ============================================================================
// No-op
// ============================================================================

/// Storage used when uploads are not configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStorage;

impl ObjectStorage for NoopStorage {
    async fn upload(
        &self,
        key: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<StoredObject> {
        tracing::warn!(key = %key, "Upload rejected: object storage is not configured");
        Err(StorageError::Disabled)
    }

    async fn remove(&self, _key: &str) -> StorageResult<()> {
        Ok(())
    }

    fn public_url(&self, _key: &str) -> StorageResult<String> {
        Err(StorageError::Disabled)
    }
}
