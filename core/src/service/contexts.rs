// core/src/service/contexts.rs

//! The data each product pipeline runs over. Handlers receive these wrapped
//! in `ContextData`.

use crate::model::{BlobKey, OwnerAction, Product, ProductId, ProductPayload, UserId};
use crate::validation::ValidatedProduct;
use serde::Serialize;

/// What happened to a blob the operation meant to remove.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum BlobCleanup {
  Removed,
  /// Nothing to remove (no replacement image, or an empty key).
  #[default]
  Skipped,
  /// The blob store refused; the row operation went ahead regardless.
  Failed(String),
}

impl BlobCleanup {
  pub fn is_failed(&self) -> bool {
    matches!(self, BlobCleanup::Failed(_))
  }
}

/// Context of a pipeline that targets one existing product on behalf of a
/// caller who must own it.
pub trait OwnedTarget: Send + Sync + 'static {
  const ACTION: OwnerAction;

  fn product_id(&self) -> ProductId;
  fn caller(&self) -> UserId;
  fn product(&self) -> Option<&Product>;
  fn set_product(&mut self, product: Product);
}

macro_rules! owned_target {
  ($ctx:ty, $action:expr) => {
    impl OwnedTarget for $ctx {
      const ACTION: OwnerAction = $action;

      fn product_id(&self) -> ProductId {
        self.product_id
      }

      fn caller(&self) -> UserId {
        self.caller
      }

      fn product(&self) -> Option<&Product> {
        self.product.as_ref()
      }

      fn set_product(&mut self, product: Product) {
        self.product = Some(product);
      }
    }
  };
}

#[derive(Debug, Clone)]
pub struct CreateCtxData {
  pub owner_id: UserId,
  pub payload: ProductPayload,
  pub validated: Option<ValidatedProduct>,
  pub stored_image: Option<BlobKey>,
  pub created: Option<Product>,
}

impl CreateCtxData {
  pub fn new(owner_id: UserId, payload: ProductPayload) -> Self {
    Self {
      owner_id,
      payload,
      validated: None,
      stored_image: None,
      created: None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct EditCtxData {
  pub product_id: ProductId,
  pub caller: UserId,
  pub product: Option<Product>,
}

impl EditCtxData {
  pub fn new(product_id: ProductId, caller: UserId) -> Self {
    Self {
      product_id,
      caller,
      product: None,
    }
  }
}

owned_target!(EditCtxData, OwnerAction::Edit);

#[derive(Debug, Clone)]
pub struct UpdateCtxData {
  pub product_id: ProductId,
  pub caller: UserId,
  pub payload: ProductPayload,
  pub validated: Option<ValidatedProduct>,
  /// The row as it was before the update.
  pub product: Option<Product>,
  pub new_image: Option<BlobKey>,
  pub updated: Option<Product>,
  pub previous_image: BlobCleanup,
}

impl UpdateCtxData {
  pub fn new(product_id: ProductId, caller: UserId, payload: ProductPayload) -> Self {
    Self {
      product_id,
      caller,
      payload,
      validated: None,
      product: None,
      new_image: None,
      updated: None,
      previous_image: BlobCleanup::Skipped,
    }
  }

  /// True when the validated payload carries no replacement image.
  pub fn keeps_current_image(&self) -> bool {
    self.validated.as_ref().map_or(true, |v| v.image.is_none())
  }
}

owned_target!(UpdateCtxData, OwnerAction::Edit);

#[derive(Debug, Clone)]
pub struct DestroyCtxData {
  pub product_id: ProductId,
  pub caller: UserId,
  pub product: Option<Product>,
  pub image: BlobCleanup,
}

impl DestroyCtxData {
  pub fn new(product_id: ProductId, caller: UserId) -> Self {
    Self {
      product_id,
      caller,
      product: None,
      image: BlobCleanup::Skipped,
    }
  }
}

owned_target!(DestroyCtxData, OwnerAction::Delete);
