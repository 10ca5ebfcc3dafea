// app/src/errors.rs

use crate::web::flash::FlashMessage;
use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use anuncios::CatalogError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Catalog(#[from] CatalogError),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Bad Request: {0}")]
  BadRequest(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Catalog(CatalogError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::Catalog(CatalogError::NotFound(_)) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Catalog(CatalogError::Forbidden { .. }) => StatusCode::SEE_OTHER,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
      AppError::Catalog(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    match self {
      AppError::Catalog(CatalogError::Validation(errors)) => {
        tracing::info!(fields = ?errors.fields().collect::<Vec<_>>(), "Rejecting invalid product input");
        HttpResponse::UnprocessableEntity().json(json!({ "errors": errors }))
      }
      AppError::Catalog(CatalogError::Forbidden { action, product_id }) => {
        tracing::warn!(%product_id, %action, "Redirecting after ownership check failure");
        HttpResponse::SeeOther()
          .insert_header((header::LOCATION, "/products"))
          .cookie(FlashMessage::denied(*action).cookie())
          .finish()
      }
      AppError::Catalog(CatalogError::NotFound(id)) => {
        HttpResponse::NotFound().json(json!({"error": format!("Product {} not found", id)}))
      }
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"error": m})),
      AppError::Auth(m) => HttpResponse::Unauthorized().json(json!({"error": m})),
      AppError::BadRequest(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      AppError::Catalog(err) => {
        tracing::error!(application_error = %err, storage = err.is_storage_failure(), "Responding with error");
        HttpResponse::InternalServerError().json(json!({"error": "The product operation failed"}))
      }
      AppError::Config(m) => {
        tracing::error!(detail = %m, "Responding with configuration error");
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
