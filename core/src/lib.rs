// core/src/lib.rs

//! anuncios: per-user product listings with ownership-guarded updates.
//!
//! * `validation` checks raw create/update input and sniffs uploaded images.
//! * `repository` stores product rows (SQLite through `sqlx`).
//! * `blob` stores images (any `object_store` backend).
//! * `service` runs create, edit, update and destroy as step pipelines built
//!   on the small engine in `flow`.

pub mod blob;
pub mod error;
pub mod flow;
pub mod model;
pub mod repository;
pub mod service;
pub mod validation;

pub use crate::blob::{BlobError, BlobStore, ObjectBlobStore, PRODUCT_IMAGES_AREA};
pub use crate::error::{CatalogError, CatalogResult, FlowError};
pub use crate::flow::{ContextData, FlowRegistry, Pipeline, PipelineControl, PipelineResult};
pub use crate::model::{BlobKey, ImageUpload, NewProduct, OwnerAction, Product, ProductFields, ProductId, ProductPayload, UserId};
pub use crate::repository::{ProductRepository, SqliteProductRepository};
pub use crate::service::{BlobCleanup, DestroyOutcome, ProductService, UpdateOutcome};
pub use crate::validation::{ImagePolicy, ValidationErrors, ValidationRules};
