// core/src/service/destroy_pipeline.rs

use super::common_steps::{authorize_owner_step, load_product_step, AUTHORIZE_OWNER, LOAD_PRODUCT};
use super::contexts::{BlobCleanup, DestroyCtxData};
use super::CatalogDeps;
use crate::error::{CatalogError, CatalogResult};
use crate::flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::{error, info, instrument};

pub fn register_destroy_pipeline(flows: &FlowRegistry<CatalogError>, deps: &Arc<CatalogDeps>) {
  let mut p = Pipeline::<DestroyCtxData, CatalogError>::new(&[
    (LOAD_PRODUCT, false, None),
    (AUTHORIZE_OWNER, false, None),
    ("remove_product_image", false, None),
    ("remove_product_row", false, None),
  ]);

  let step_deps = deps.clone();
  p.on_root(LOAD_PRODUCT, move |ctx_data| load_product_step(step_deps.clone(), ctx_data));

  p.on_root(AUTHORIZE_OWNER, authorize_owner_step::<DestroyCtxData>);

  let step_deps = deps.clone();
  p.on_root("remove_product_image", move |ctx_data| {
    remove_image_step(step_deps.clone(), ctx_data)
  });

  let step_deps = deps.clone();
  p.on_root("remove_product_row", move |ctx_data| {
    remove_row_step(step_deps.clone(), ctx_data)
  });

  flows.register_pipeline(p);
}

/// Best effort: a blob store failure is recorded and the row is removed anyway.
#[instrument(name = "destroy::remove_product_image", skip_all)]
async fn remove_image_step(
  deps: Arc<CatalogDeps>,
  ctx_data: ContextData<DestroyCtxData>,
) -> CatalogResult<PipelineControl> {
  let key = {
    let guard = ctx_data.read();
    guard.product.as_ref().map(|p| p.image.clone())
  }; // guard dropped

  let outcome = match key {
    Some(key) if !key.is_empty() => match deps.blobs.delete(&key).await {
      Ok(()) => {
        info!(key = %key, "Product image removed.");
        BlobCleanup::Removed
      }
      Err(e) => {
        error!(error = %e, key = %key, "Failed to remove product image; removing the row regardless.");
        BlobCleanup::Failed(e.to_string())
      }
    },
    _ => BlobCleanup::Skipped,
  };
  ctx_data.write().image = outcome;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "destroy::remove_product_row", skip_all, err(Display))]
async fn remove_row_step(
  deps: Arc<CatalogDeps>,
  ctx_data: ContextData<DestroyCtxData>,
) -> CatalogResult<PipelineControl> {
  let product_id = ctx_data.read().product_id;
  deps.repo.remove(product_id).await?;
  info!(%product_id, "Product removed.");
  Ok(PipelineControl::Continue)
}
