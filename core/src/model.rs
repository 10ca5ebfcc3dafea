// core/src/model.rs

//! The product row and the identifiers and payloads that flow around it.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a product, assigned at insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ProductId(pub Uuid);

impl ProductId {
  pub fn new() -> Self {
    ProductId(Uuid::new_v4())
  }
}

impl Default for ProductId {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Display for ProductId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

impl FromStr for ProductId {
  type Err = uuid::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Uuid::parse_str(s).map(ProductId)
  }
}

/// Identifier of an authenticated user, as supplied by the auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(pub Uuid);

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

impl FromStr for UserId {
  type Err = uuid::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Uuid::parse_str(s).map(UserId)
  }
}

/// Key of a stored image, relative to the public root of the blob store,
/// e.g. `product_images/3f2c….jpg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct BlobKey(String);

impl BlobKey {
  /// Accepts `/`-separated, non-empty segments without `.` or `..`.
  pub fn parse(raw: &str) -> Option<Self> {
    let valid = !raw.is_empty()
      && raw
        .split('/')
        .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
    valid.then(|| BlobKey(raw.to_string()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl fmt::Display for BlobKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Product {
  pub id: ProductId,
  #[sqlx(rename = "user_id")]
  pub owner_id: UserId,
  pub title: String,
  pub description: String,
  pub price: f64,
  pub image: BlobKey,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// The client-editable columns, already validated and normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductFields {
  pub title: String,
  pub description: String,
  pub price: f64,
}

/// Everything needed to insert a row; `owner_id` comes from the session.
#[derive(Debug, Clone)]
pub struct NewProduct {
  pub owner_id: UserId,
  pub fields: ProductFields,
  pub image: BlobKey,
}

/// An uploaded file as received by the HTTP layer.
///
/// `size` is the full upload size; `bytes` may be truncated when the upload
/// was cut off past the size limit.
#[derive(Debug, Clone)]
pub struct ImageUpload {
  pub file_name: Option<String>,
  pub content_type: Option<String>,
  pub size: u64,
  pub bytes: Bytes,
}

impl ImageUpload {
  pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
    let bytes = bytes.into();
    Self {
      file_name: Some(file_name.into()),
      content_type: None,
      size: bytes.len() as u64,
      bytes,
    }
  }
}

/// Raw create/update input. Every field is optional here; presence is
/// the validator's job.
#[derive(Debug, Clone, Default)]
pub struct ProductPayload {
  pub title: Option<String>,
  pub description: Option<String>,
  pub price: Option<String>,
  pub image: Option<ImageUpload>,
}

/// Actions reserved to the owner of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerAction {
  Edit,
  Delete,
}

impl OwnerAction {
  /// The message shown to a non-owner who attempted the action.
  pub fn denial_message(&self) -> &'static str {
    match self {
      OwnerAction::Edit => "No tienes permiso para editar este anuncio",
      OwnerAction::Delete => "No tienes permiso para eliminar este anuncio",
    }
  }
}

impl fmt::Display for OwnerAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      OwnerAction::Edit => f.write_str("edit"),
      OwnerAction::Delete => f.write_str("delete"),
    }
  }
}
