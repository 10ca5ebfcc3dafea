// core/src/service/mod.rs

//! The Product Service. Each mutating operation is a step pipeline
//! registered once in a `FlowRegistry`, keyed by its context type.

pub mod common_steps;
pub mod contexts;
pub mod create_pipeline;
pub mod destroy_pipeline;
pub mod edit_pipeline;
pub mod update_pipeline;

pub use common_steps::ensure_owner;
pub use contexts::BlobCleanup;

use crate::blob::BlobStore;
use crate::error::{CatalogError, CatalogResult};
use crate::flow::{ContextData, FlowRegistry, PipelineResult};
use crate::model::{Product, ProductId, ProductPayload, UserId};
use crate::repository::ProductRepository;
use crate::validation::ValidationRules;
use contexts::{CreateCtxData, DestroyCtxData, EditCtxData, UpdateCtxData};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Collaborators every pipeline step may use.
pub struct CatalogDeps {
  pub repo: Arc<dyn ProductRepository>,
  pub blobs: Arc<dyn BlobStore>,
  pub rules: ValidationRules,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
  pub product: Product,
  /// Fate of the image the product pointed at before the update.
  pub previous_image: BlobCleanup,
}

#[derive(Debug, Clone, Serialize)]
pub struct DestroyOutcome {
  pub product: Product,
  pub image: BlobCleanup,
}

pub struct ProductService {
  deps: Arc<CatalogDeps>,
  flows: FlowRegistry<CatalogError>,
}

impl ProductService {
  pub fn new(repo: Arc<dyn ProductRepository>, blobs: Arc<dyn BlobStore>, rules: ValidationRules) -> Self {
    let deps = Arc::new(CatalogDeps { repo, blobs, rules });
    let flows = FlowRegistry::new();

    create_pipeline::register_create_pipeline(&flows, &deps);
    edit_pipeline::register_edit_pipeline(&flows, &deps);
    update_pipeline::register_update_pipeline(&flows, &deps);
    destroy_pipeline::register_destroy_pipeline(&flows, &deps);
    info!("Product pipelines registered.");

    Self { deps, flows }
  }

  pub fn rules(&self) -> &ValidationRules {
    &self.deps.rules
  }

  async fn run<T: Send + Sync + 'static>(&self, ctx_data: ContextData<T>) -> CatalogResult<()> {
    match self.flows.run(ctx_data).await? {
      PipelineResult::Completed => Ok(()),
      PipelineResult::Stopped => Err(CatalogError::Internal(format!(
        "pipeline for {} stopped before completing",
        std::any::type_name::<T>()
      ))),
    }
  }

  /// Validates, stores the image, then inserts the row owned by `owner_id`.
  #[instrument(name = "ProductService::create", skip(self, payload), err(Display))]
  pub async fn create(&self, owner_id: UserId, payload: ProductPayload) -> CatalogResult<Product> {
    let ctx_data = ContextData::new(CreateCtxData::new(owner_id, payload));
    self.run(ctx_data.clone()).await?;
    let created = ctx_data.read().created.clone();
    created.ok_or_else(|| CatalogError::Internal("create pipeline produced no product".to_string()))
  }

  /// Any caller may view any product.
  #[instrument(name = "ProductService::view", skip(self), err(Display))]
  pub async fn view(&self, id: ProductId) -> CatalogResult<Product> {
    self.deps.repo.find_by_id(id).await
  }

  #[instrument(name = "ProductService::list_mine", skip(self), err(Display))]
  pub async fn list_mine(&self, owner_id: UserId) -> CatalogResult<Vec<Product>> {
    self.deps.repo.list_by_owner(owner_id).await
  }

  /// The product, if `caller` may edit it.
  #[instrument(name = "ProductService::edit", skip(self), err(Display))]
  pub async fn edit(&self, id: ProductId, caller: UserId) -> CatalogResult<Product> {
    let ctx_data = ContextData::new(EditCtxData::new(id, caller));
    self.run(ctx_data.clone()).await?;
    let product = ctx_data.read().product.clone();
    product.ok_or(CatalogError::NotFound(id))
  }

  #[instrument(name = "ProductService::update", skip(self, payload), err(Display))]
  pub async fn update(&self, id: ProductId, caller: UserId, payload: ProductPayload) -> CatalogResult<UpdateOutcome> {
    let ctx_data = ContextData::new(UpdateCtxData::new(id, caller, payload));
    self.run(ctx_data.clone()).await?;
    let guard = ctx_data.read();
    let product = guard
      .updated
      .clone()
      .ok_or_else(|| CatalogError::Internal("update pipeline produced no product".to_string()))?;
    Ok(UpdateOutcome {
      product,
      previous_image: guard.previous_image.clone(),
    })
  }

  #[instrument(name = "ProductService::destroy", skip(self), err(Display))]
  pub async fn destroy(&self, id: ProductId, caller: UserId) -> CatalogResult<DestroyOutcome> {
    let ctx_data = ContextData::new(DestroyCtxData::new(id, caller));
    self.run(ctx_data.clone()).await?;
    let guard = ctx_data.read();
    let product = guard.product.clone().ok_or(CatalogError::NotFound(id))?;
    Ok(DestroyOutcome {
      product,
      image: guard.image.clone(),
    })
  }
}
