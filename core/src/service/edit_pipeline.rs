// core/src/service/edit_pipeline.rs

//! Guards the edit form: only the owner gets the product back.

use super::common_steps::{authorize_owner_step, load_product_step, AUTHORIZE_OWNER, LOAD_PRODUCT};
use super::contexts::EditCtxData;
use super::CatalogDeps;
use crate::error::CatalogError;
use crate::flow::{FlowRegistry, Pipeline};
use std::sync::Arc;

pub fn register_edit_pipeline(flows: &FlowRegistry<CatalogError>, deps: &Arc<CatalogDeps>) {
  let mut p = Pipeline::<EditCtxData, CatalogError>::new(&[(LOAD_PRODUCT, false, None), (AUTHORIZE_OWNER, false, None)]);

  let step_deps = deps.clone();
  p.on_root(LOAD_PRODUCT, move |ctx_data| load_product_step(step_deps.clone(), ctx_data));
  p.on_root(AUTHORIZE_OWNER, authorize_owner_step::<EditCtxData>);

  flows.register_pipeline(p);
}
