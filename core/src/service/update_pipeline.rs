// core/src/service/update_pipeline.rs

//! validate → load_product → authorize_owner → store_product_image →
//! replace_product_row → remove_previous_image
//!
//! The two image steps are skipped when the payload keeps the current image.
//! The previous image is removed only after the row points at the new one.

use super::common_steps::{authorize_owner_step, load_product_step, AUTHORIZE_OWNER, LOAD_PRODUCT};
use super::contexts::{BlobCleanup, UpdateCtxData};
use super::CatalogDeps;
use crate::blob::{BlobError, PRODUCT_IMAGES_AREA};
use crate::error::{CatalogError, CatalogResult};
use crate::flow::{ContextData, FlowRegistry, Pipeline, PipelineControl, SkipCondition};
use crate::validation::{validate, ValidationMode};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub fn register_update_pipeline(flows: &FlowRegistry<CatalogError>, deps: &Arc<CatalogDeps>) {
  let keeps_image: SkipCondition<UpdateCtxData> = Arc::new(|ctx: &UpdateCtxData| ctx.keeps_current_image());

  let mut p = Pipeline::<UpdateCtxData, CatalogError>::new(&[
    ("validate", false, None),
    (LOAD_PRODUCT, false, None),
    (AUTHORIZE_OWNER, false, None),
    ("store_product_image", false, Some(keeps_image.clone())),
    ("replace_product_row", false, None),
    ("remove_previous_image", false, Some(keeps_image)),
  ]);

  let step_deps = deps.clone();
  p.on_root("validate", move |ctx_data| validate_step(step_deps.clone(), ctx_data));

  let step_deps = deps.clone();
  p.on_root(LOAD_PRODUCT, move |ctx_data| load_product_step(step_deps.clone(), ctx_data));

  p.on_root(AUTHORIZE_OWNER, authorize_owner_step::<UpdateCtxData>);

  let step_deps = deps.clone();
  p.on_root("store_product_image", move |ctx_data| {
    store_image_step(step_deps.clone(), ctx_data)
  });

  let step_deps = deps.clone();
  p.on_root("replace_product_row", move |ctx_data| {
    replace_row_step(step_deps.clone(), ctx_data)
  });

  let step_deps = deps.clone();
  p.on_root("remove_previous_image", move |ctx_data| {
    remove_previous_image_step(step_deps.clone(), ctx_data)
  });

  flows.register_pipeline(p);
}

#[instrument(name = "update::validate", skip_all, err(Display))]
async fn validate_step(deps: Arc<CatalogDeps>, ctx_data: ContextData<UpdateCtxData>) -> CatalogResult<PipelineControl> {
  let mut guard = ctx_data.write();
  let validated = validate(&guard.payload, ValidationMode::Update, &deps.rules).map_err(CatalogError::Validation)?;
  guard.validated = Some(validated);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "update::store_product_image", skip_all, err(Display))]
async fn store_image_step(
  deps: Arc<CatalogDeps>,
  ctx_data: ContextData<UpdateCtxData>,
) -> CatalogResult<PipelineControl> {
  let image = {
    let guard = ctx_data.read();
    guard.validated.as_ref().and_then(|v| v.image.clone())
  }; // guard dropped
  let Some(image) = image else {
    return Ok(PipelineControl::Continue);
  };

  let key = deps
    .blobs
    .put(PRODUCT_IMAGES_AREA, image.upload.bytes, image.format.mime())
    .await?;
  info!(key = %key, "Replacement image stored.");
  ctx_data.write().new_image = Some(key);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "update::replace_product_row", skip_all, err(Display))]
async fn replace_row_step(
  deps: Arc<CatalogDeps>,
  ctx_data: ContextData<UpdateCtxData>,
) -> CatalogResult<PipelineControl> {
  let (product_id, fields, current_image, new_image) = {
    let guard = ctx_data.read();
    (
      guard.product_id,
      guard.validated.as_ref().map(|v| v.fields.clone()),
      guard.product.as_ref().map(|p| p.image.clone()),
      guard.new_image.clone(),
    )
  }; // guard dropped
  let (Some(fields), Some(current_image)) = (fields, current_image) else {
    return Err(CatalogError::Internal(
      "replace_product_row ran without validated fields and a loaded product".to_string(),
    ));
  };

  let image = new_image.clone().unwrap_or(current_image);
  match deps.repo.replace(product_id, &fields, &image).await {
    Ok(updated) => {
      info!(%product_id, image = %updated.image, "Product updated.");
      ctx_data.write().updated = Some(updated);
      Ok(PipelineControl::Continue)
    }
    Err(e) => {
      if let Some(new_key) = new_image {
        error!(error = %e, key = %new_key, "Row replace failed; removing the replacement image.");
        if let Err(cleanup_err) = deps.blobs.delete(&new_key).await {
          warn!(error = %cleanup_err, key = %new_key, "Could not remove replacement image.");
        }
        ctx_data.write().new_image = None;
      }
      Err(e)
    }
  }
}

#[instrument(name = "update::remove_previous_image", skip_all)]
async fn remove_previous_image_step(
  deps: Arc<CatalogDeps>,
  ctx_data: ContextData<UpdateCtxData>,
) -> CatalogResult<PipelineControl> {
  let previous = {
    let guard = ctx_data.read();
    guard.product.as_ref().map(|p| p.image.clone())
  }; // guard dropped

  let outcome = match previous {
    Some(key) if !key.is_empty() => match deps.blobs.delete(&key).await {
      Ok(()) => {
        info!(key = %key, "Previous image removed.");
        BlobCleanup::Removed
      }
      Err(e @ BlobError::NotFound(_)) => {
        warn!(key = %key, "Previous image was already gone.");
        BlobCleanup::Failed(e.to_string())
      }
      Err(e) => {
        error!(error = %e, key = %key, "Failed to remove previous image; keeping the updated row.");
        BlobCleanup::Failed(e.to_string())
      }
    },
    _ => BlobCleanup::Skipped,
  };
  ctx_data.write().previous_image = outcome;
  Ok(PipelineControl::Continue)
}
