// app/src/state.rs
use anuncios::{BlobStore, ProductService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub catalog: Arc<ProductService>,
  /// Serves stored images back under `/storage`.
  pub blobs: Arc<dyn BlobStore>,
}
