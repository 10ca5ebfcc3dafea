// core/src/service/create_pipeline.rs

use super::contexts::CreateCtxData;
use super::CatalogDeps;
use crate::blob::PRODUCT_IMAGES_AREA;
use crate::error::{CatalogError, CatalogResult};
use crate::flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use crate::model::NewProduct;
use crate::validation::{validate, ValidationMode};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub fn register_create_pipeline(flows: &FlowRegistry<CatalogError>, deps: &Arc<CatalogDeps>) {
  let mut p = Pipeline::<CreateCtxData, CatalogError>::new(&[
    ("validate", false, None),
    ("store_product_image", false, None),
    ("insert_product_row", false, None),
  ]);

  let step_deps = deps.clone();
  p.on_root("validate", move |ctx_data| validate_step(step_deps.clone(), ctx_data));

  let step_deps = deps.clone();
  p.on_root("store_product_image", move |ctx_data| {
    store_image_step(step_deps.clone(), ctx_data)
  });

  let step_deps = deps.clone();
  p.on_root("insert_product_row", move |ctx_data| {
    insert_row_step(step_deps.clone(), ctx_data)
  });

  flows.register_pipeline(p);
}

#[instrument(name = "create::validate", skip_all, err(Display))]
async fn validate_step(deps: Arc<CatalogDeps>, ctx_data: ContextData<CreateCtxData>) -> CatalogResult<PipelineControl> {
  let mut guard = ctx_data.write();
  let validated = validate(&guard.payload, ValidationMode::Create, &deps.rules).map_err(CatalogError::Validation)?;
  guard.validated = Some(validated);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "create::store_product_image", skip_all, err(Display))]
async fn store_image_step(
  deps: Arc<CatalogDeps>,
  ctx_data: ContextData<CreateCtxData>,
) -> CatalogResult<PipelineControl> {
  let image = {
    let guard = ctx_data.read();
    guard.validated.as_ref().and_then(|v| v.image.clone())
  }; // guard dropped
  let image = image.ok_or_else(|| CatalogError::Internal("validated image missing on create".to_string()))?;

  let key = deps
    .blobs
    .put(PRODUCT_IMAGES_AREA, image.upload.bytes, image.format.mime())
    .await?;
  info!(key = %key, "Product image stored.");
  ctx_data.write().stored_image = Some(key);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "create::insert_product_row", skip_all, err(Display))]
async fn insert_row_step(
  deps: Arc<CatalogDeps>,
  ctx_data: ContextData<CreateCtxData>,
) -> CatalogResult<PipelineControl> {
  let (owner_id, fields, image) = {
    let guard = ctx_data.read();
    (
      guard.owner_id,
      guard.validated.as_ref().map(|v| v.fields.clone()),
      guard.stored_image.clone(),
    )
  }; // guard dropped
  let (Some(fields), Some(image)) = (fields, image) else {
    return Err(CatalogError::Internal("insert_product_row ran without validated fields and a stored image".to_string()));
  };

  let new_product = NewProduct {
    owner_id,
    fields,
    image: image.clone(),
  };
  match deps.repo.insert(new_product).await {
    Ok(product) => {
      info!(product_id = %product.id, owner_id = %product.owner_id, "Product created.");
      ctx_data.write().created = Some(product);
      Ok(PipelineControl::Continue)
    }
    Err(e) => {
      error!(error = %e, key = %image, "Row insert failed; removing the stored image.");
      if let Err(cleanup_err) = deps.blobs.delete(&image).await {
        warn!(error = %cleanup_err, key = %image, "Could not remove image after failed insert.");
      }
      ctx_data.write().stored_image = None;
      Err(e)
    }
  }
}
