// app/src/web/handlers/storage_handlers.rs

use actix_web::http::header;
use actix_web::{web, HttpResponse};
use anuncios::blob::content_type_for;
use anuncios::{BlobError, BlobKey};
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;

/// Serves a stored image. Public: product pages link here directly.
#[instrument(name = "handler::serve_blob", skip(app_state))]
pub async fn serve_blob_handler(app_state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
  let raw = path.into_inner();
  let key = BlobKey::parse(&raw).ok_or_else(|| AppError::NotFound(format!("No stored file at '{}'", raw)))?;
  let bytes = match app_state.blobs.get(&key).await {
    Ok(bytes) => bytes,
    Err(BlobError::NotFound(_)) => return Err(AppError::NotFound(format!("No stored file at '{}'", key))),
    Err(e) => return Err(AppError::Catalog(e.into())),
  };
  let content_type = content_type_for(&key);
  let mut response = HttpResponse::Ok();
  response
    .insert_header((header::CACHE_CONTROL, "public, max-age=3600"))
    .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"));
  // SVG is markup: scripts inside an upload must not run on this origin.
  if content_type == "image/svg+xml" {
    response.insert_header((header::CONTENT_SECURITY_POLICY, "sandbox"));
  }
  Ok(response.insert_header((header::CONTENT_TYPE, content_type)).body(bytes))
}
