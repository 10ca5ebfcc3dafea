// core/src/service/common_steps.rs

//! Steps shared by every pipeline that acts on an existing product:
//! `load_product` then `authorize_owner`.

use super::contexts::OwnedTarget;
use super::CatalogDeps;
use crate::error::{CatalogError, CatalogResult};
use crate::flow::{ContextData, PipelineControl};
use crate::model::{OwnerAction, Product, UserId};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub const LOAD_PRODUCT: &str = "load_product";
pub const AUTHORIZE_OWNER: &str = "authorize_owner";

/// The one ownership rule: only the owner may edit or delete a product.
pub fn ensure_owner(product: &Product, caller: UserId, action: OwnerAction) -> CatalogResult<()> {
  if product.owner_id == caller {
    return Ok(());
  }
  warn!(
    product_id = %product.id,
    owner_id = %product.owner_id,
    caller = %caller,
    %action,
    "Ownership check failed."
  );
  Err(CatalogError::Forbidden {
    action,
    product_id: product.id,
  })
}

#[instrument(name = "common_step::load_product", skip_all, err(Display))]
pub async fn load_product_step<T: OwnedTarget>(
  deps: Arc<CatalogDeps>,
  ctx_data: ContextData<T>,
) -> CatalogResult<PipelineControl> {
  let product_id = ctx_data.read().product_id();
  let product = deps.repo.find_by_id(product_id).await?;
  debug!(%product_id, "Product loaded.");
  ctx_data.write().set_product(product);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "common_step::authorize_owner", skip_all, err(Display))]
pub async fn authorize_owner_step<T: OwnedTarget>(ctx_data: ContextData<T>) -> CatalogResult<PipelineControl> {
  let guard = ctx_data.read();
  let product = guard
    .product()
    .ok_or_else(|| CatalogError::Internal(format!("'{}' ran before '{}'", AUTHORIZE_OWNER, LOAD_PRODUCT)))?;
  ensure_owner(product, guard.caller(), T::ACTION)?;
  Ok(PipelineControl::Continue)
}
