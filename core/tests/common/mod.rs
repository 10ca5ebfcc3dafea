// tests/common/mod.rs
#![allow(dead_code)]

use anuncios::blob::{BlobError, BlobStore, ObjectBlobStore};
use anuncios::flow::{ContextData, Handler, PipelineControl};
use anuncios::{
  BlobKey, CatalogError, FlowError, ImageUpload, ProductPayload, ProductService, SqliteProductRepository, UserId,
  ValidationRules,
};
use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

// --- Tracing ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Engine fixtures ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Flow error: {0}")]
  Flow(String),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(err: FlowError) -> Self {
    TestError::Flow(err.to_string())
  }
}

pub fn create_simple_handler(step_name: &'static str, message_to_append: &'static str) -> Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      tracing::debug!(target: "test_handlers", step = step_name, counter = guard.counter, "executed");
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn create_failing_handler(step_name: &'static str, error_message: &'static str) -> Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Handler(error_message.to_string()))
    })
  })
}

// --- Image bytes ---
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01];
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

pub fn jpeg_upload() -> ImageUpload {
  ImageUpload::new("chair.jpg", Bytes::from_static(JPEG_BYTES))
}

pub fn png_upload() -> ImageUpload {
  ImageUpload::new("chair.png", Bytes::from_static(PNG_BYTES))
}

pub fn text_upload() -> ImageUpload {
  ImageUpload::new("notes.txt", Bytes::from_static(b"just some notes, not a picture"))
}

pub fn payload(title: &str, description: &str, price: &str, image: Option<ImageUpload>) -> ProductPayload {
  ProductPayload {
    title: Some(title.to_string()),
    description: Some(description.to_string()),
    price: Some(price.to_string()),
    image,
  }
}

pub fn new_user() -> UserId {
  UserId(Uuid::new_v4())
}

// --- Blob store double ---

/// In-memory blob store that counts calls and can be told to fail.
#[derive(Debug)]
pub struct RecordingBlobStore {
  inner: ObjectBlobStore,
  pub puts: AtomicUsize,
  pub deletes: AtomicUsize,
  pub fail_put: AtomicBool,
  pub fail_delete: AtomicBool,
}

impl RecordingBlobStore {
  pub fn new() -> Self {
    Self {
      inner: ObjectBlobStore::in_memory(),
      puts: AtomicUsize::new(0),
      deletes: AtomicUsize::new(0),
      fail_put: AtomicBool::new(false),
      fail_delete: AtomicBool::new(false),
    }
  }

  pub fn put_count(&self) -> usize {
    self.puts.load(Ordering::SeqCst)
  }

  pub fn delete_count(&self) -> usize {
    self.deletes.load(Ordering::SeqCst)
  }

  pub async fn exists(&self, key: &BlobKey) -> bool {
    self.inner.get(key).await.is_ok()
  }
}

fn unavailable(key: &str) -> BlobError {
  BlobError::Store {
    key: key.to_string(),
    source: object_store::Error::Generic {
      store: "recording",
      source: "blob store unavailable".into(),
    },
  }
}

#[async_trait]
impl BlobStore for RecordingBlobStore {
  async fn put(&self, area: &str, bytes: Bytes, mime: &str) -> Result<BlobKey, BlobError> {
    if self.fail_put.load(Ordering::SeqCst) {
      return Err(unavailable(area));
    }
    let key = self.inner.put(area, bytes, mime).await?;
    self.puts.fetch_add(1, Ordering::SeqCst);
    Ok(key)
  }

  async fn get(&self, key: &BlobKey) -> Result<Bytes, BlobError> {
    self.inner.get(key).await
  }

  async fn delete(&self, key: &BlobKey) -> Result<(), BlobError> {
    if self.fail_delete.load(Ordering::SeqCst) {
      return Err(unavailable(key.as_str()));
    }
    self.inner.delete(key).await?;
    self.deletes.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}

// --- Service fixture ---

pub struct Fixture {
  pub service: ProductService,
  pub repo: Arc<SqliteProductRepository>,
  pub blobs: Arc<RecordingBlobStore>,
}

impl Fixture {
  pub async fn new() -> Self {
    Self::with_rules(ValidationRules::default()).await
  }

  pub async fn with_rules(rules: ValidationRules) -> Self {
    let repo = Arc::new(SqliteProductRepository::in_memory().await.expect("in-memory sqlite"));
    repo.migrate().await.expect("migrations apply");
    let blobs = Arc::new(RecordingBlobStore::new());
    let service = ProductService::new(repo.clone(), blobs.clone(), rules);
    Self { service, repo, blobs }
  }

  pub async fn row_count(&self) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
      .fetch_one(self.repo.pool())
      .await
      .expect("count rows")
  }
}

pub fn is_forbidden(err: &CatalogError) -> bool {
  matches!(err, CatalogError::Forbidden { .. })
}
