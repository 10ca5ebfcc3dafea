// core/src/error.rs

use crate::blob::BlobError;
use crate::model::{OwnerAction, ProductId};
use crate::validation::ValidationErrors;
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Failures of the pipeline engine itself, as opposed to failures of the
/// work its handlers do.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Handler missing for required step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("No pipeline registered for context type {context_type}")]
  NotRegistered { context_type: String },

  #[error("Type mismatch during context dispatch (expected {expected_type})")]
  TypeMismatch { expected_type: String },

  #[error("Error in handler. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal pipeline error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    FlowError::HandlerError { source: err }
  }
}

/// Every way a product operation can fail.
#[derive(Debug, Error)]
pub enum CatalogError {
  /// Field-keyed input errors; raised before any storage I/O.
  #[error("Validation failed: {0}")]
  Validation(ValidationErrors),

  #[error("Product {0} not found")]
  NotFound(ProductId),

  /// The caller is not the owner. No state was changed.
  #[error("Caller may not {action} product {product_id}")]
  Forbidden { action: OwnerAction, product_id: ProductId },

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Database migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Blob store error: {0}")]
  Blob(#[from] BlobError),

  #[error("Pipeline error: {0}")]
  Flow(#[from] FlowError),

  #[error("Internal error: {0}")]
  Internal(String),
}

impl CatalogError {
  /// True for row-store or blob-store unavailability, the failures a caller
  /// should treat as fatal for the request.
  pub fn is_storage_failure(&self) -> bool {
    matches!(
      self,
      CatalogError::Database(_) | CatalogError::Migration(_) | CatalogError::Blob(_)
    )
  }
}

pub type CatalogResult<T, E = CatalogError> = std::result::Result<T, E>;
