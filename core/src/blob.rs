// core/src/blob.rs

//! Image storage. `BlobStore` is the seam the product pipelines use;
//! `ObjectBlobStore` backs it with any `object_store` implementation
//! (local filesystem in production, in-memory in tests).

use crate::model::BlobKey;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::{memory::InMemory, parse_url, path::Path, ObjectStore, PutPayload};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// Area that product images are written under.
pub const PRODUCT_IMAGES_AREA: &str = "product_images";

/// Root under which every key is stored; keys are served from here.
pub const PUBLIC_ROOT: &str = "public";

#[derive(Debug, Error)]
pub enum BlobError {
  #[error("Blob not found: {0}")]
  NotFound(String),

  #[error("Invalid blob key: {0}")]
  InvalidKey(String),

  #[error("Invalid blob store url '{url}': {message}")]
  InvalidUrl { url: String, message: String },

  #[error("Object store failure for '{key}': {source}")]
  Store {
    key: String,
    #[source]
    source: object_store::Error,
  },
}

impl BlobError {
  fn from_store(key: &str, err: object_store::Error) -> Self {
    match err {
      object_store::Error::NotFound { .. } => BlobError::NotFound(key.to_string()),
      source => BlobError::Store {
        key: key.to_string(),
        source,
      },
    }
  }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
  /// Stores `bytes` under a freshly generated key inside `area`.
  async fn put(&self, area: &str, bytes: Bytes, mime: &str) -> Result<BlobKey, BlobError>;

  async fn get(&self, key: &BlobKey) -> Result<Bytes, BlobError>;

  /// Fails with `BlobError::NotFound` when nothing is stored under `key`.
  async fn delete(&self, key: &BlobKey) -> Result<(), BlobError>;
}

/// Picks a file extension for `mime`, preferring the one spelled like the
/// subtype (`image/jpeg` → `jpeg`, `image/svg+xml` → `svg`).
pub fn extension_for_mime(mime: &str) -> &'static str {
  let subtype = mime.split('/').nth(1).unwrap_or_default();
  let subtype = subtype.split(';').next().unwrap_or_default().trim();
  let base = subtype.split('+').next().unwrap_or_default();
  let Some(candidates) = mime_guess::get_mime_extensions_str(mime) else {
    return "bin";
  };
  candidates
    .iter()
    .find(|ext| **ext == subtype)
    .or_else(|| candidates.iter().find(|ext| **ext == base))
    .or_else(|| candidates.first())
    .copied()
    .unwrap_or("bin")
}

/// Content type to serve a stored key with, guessed from its extension.
pub fn content_type_for(key: &BlobKey) -> String {
  mime_guess::from_path(key.as_str())
    .first_or_octet_stream()
    .essence_str()
    .to_string()
}

#[derive(Debug, Clone)]
pub struct ObjectBlobStore {
  object_store: Arc<dyn ObjectStore>,
  root: Path,
}

impl ObjectBlobStore {
  pub fn new(object_store: Arc<dyn ObjectStore>, base: Path) -> Self {
    Self {
      object_store,
      root: base.child(PUBLIC_ROOT),
    }
  }

  /// An in-memory store; contents vanish with the process.
  pub fn in_memory() -> Self {
    Self::new(Arc::new(InMemory::new()), Path::default())
  }

  /// Builds a store from a URL such as `file:///var/lib/anuncios/storage`
  /// or `memory:///`.
  pub fn from_url(url_str: &str) -> Result<Self, BlobError> {
    let invalid = |message: String| BlobError::InvalidUrl {
      url: url_str.to_string(),
      message,
    };
    let url = url_str.parse::<Url>().map_err(|e| invalid(e.to_string()))?;
    let (object_store, base) = parse_url(&url).map_err(|e| invalid(e.to_string()))?;
    info!(blob_store_url = %url, "Blob store configured.");
    Ok(Self::new(Arc::from(object_store), base))
  }

  fn location(&self, key: &BlobKey) -> Path {
    key.as_str().split('/').fold(self.root.clone(), |path, part| path.child(part))
  }
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
  async fn put(&self, area: &str, bytes: Bytes, mime: &str) -> Result<BlobKey, BlobError> {
    let name = format!("{}/{}.{}", area, Uuid::new_v4().simple(), extension_for_mime(mime));
    let key = BlobKey::parse(&name).ok_or_else(|| BlobError::InvalidKey(name.clone()))?;
    let size = bytes.len();
    self
      .object_store
      .put(&self.location(&key), PutPayload::from(bytes))
      .await
      .map_err(|e| BlobError::from_store(key.as_str(), e))?;
    debug!(key = %key, size, mime, "Blob stored.");
    Ok(key)
  }

  async fn get(&self, key: &BlobKey) -> Result<Bytes, BlobError> {
    let result = self
      .object_store
      .get(&self.location(key))
      .await
      .map_err(|e| BlobError::from_store(key.as_str(), e))?;
    result.bytes().await.map_err(|e| BlobError::from_store(key.as_str(), e))
  }

  async fn delete(&self, key: &BlobKey) -> Result<(), BlobError> {
    let location = self.location(key);
    // Not every backend reports deleting a missing object as an error.
    self
      .object_store
      .head(&location)
      .await
      .map_err(|e| BlobError::from_store(key.as_str(), e))?;
    self
      .object_store
      .delete(&location)
      .await
      .map_err(|e| BlobError::from_store(key.as_str(), e))?;
    debug!(key = %key, "Blob deleted.");
    Ok(())
  }
}
