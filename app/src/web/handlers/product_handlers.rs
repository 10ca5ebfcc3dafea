// app/src/web/handlers/product_handlers.rs

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use anuncios::validation::{DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS};
use anuncios::{ImagePolicy, ProductId, ProductPayload, UserId};
use bytes::Bytes;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::auth::AuthenticatedUser;
use crate::web::flash::FlashMessage;
use crate::web::forms::{read_product_form, FormMethod};

fn redirect_to_listing(flash: FlashMessage) -> HttpResponse {
  HttpResponse::SeeOther()
    .insert_header((header::LOCATION, "/products"))
    .cookie(flash.cookie())
    .finish()
}

#[instrument(name = "handler::list_products", skip(app_state, req, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let products = app_state.catalog.list_mine(auth_user.user_id).await?;
  let flash = FlashMessage::pending(&req);
  info!(count = products.len(), flash = ?flash, "Listing caller's products.");

  let body = json!({
    "products": products,
    "flash": flash.map(|f| json!({ "message": f.text(), "error": f.is_error() })),
  });
  let mut response = HttpResponse::Ok();
  if flash.is_some() {
    response.cookie(FlashMessage::removal_cookie());
  }
  Ok(response.json(body))
}

/// Describes the create form: the fields, their limits and the accepted images.
#[instrument(name = "handler::create_form", skip_all)]
pub async fn create_form_handler(app_state: web::Data<AppState>, _auth_user: AuthenticatedUser) -> HttpResponse {
  let rules = app_state.catalog.rules();
  HttpResponse::Ok().json(json!({
    "action": "/products",
    "method": "POST",
    "enctype": "multipart/form-data",
    "fields": {
      "title": { "required": true, "max_chars": TITLE_MAX_CHARS },
      "description": { "required": true, "max_chars": DESCRIPTION_MAX_CHARS },
      "price": { "required": true, "type": "number" },
      "image": {
        "required": true,
        "required_on_update": rules.image_policy == ImagePolicy::RequireOnUpdate,
        "formats": ["jpeg", "png", "jpg", "gif", "svg"],
        "max_kb": rules.max_image_kb,
      },
    },
  }))
}

#[instrument(name = "handler::create_product", skip(app_state, req, body, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: Bytes,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let form = read_product_form(&req, body).await?;
  let product = app_state.catalog.create(auth_user.user_id, form.payload).await?;
  info!(product_id = %product.id, "Product created via HTTP.");
  Ok(redirect_to_listing(FlashMessage::Created))
}

#[instrument(name = "handler::get_product", skip(app_state, path, _auth_user), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<ProductId>,
  _auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let product = app_state.catalog.view(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "product": product })))
}

#[instrument(name = "handler::edit_product", skip(app_state, path, auth_user), fields(product_id = %path.as_ref(), user_id = %auth_user.user_id))]
pub async fn edit_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<ProductId>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let product = app_state.catalog.edit(path.into_inner(), auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(json!({
    "product": product,
    "action": format!("/products/{}", product.id),
    "method": "PUT",
    "image_required": app_state.catalog.rules().image_policy == ImagePolicy::RequireOnUpdate,
  })))
}

#[instrument(name = "handler::update_product", skip(app_state, path, req, body, auth_user), fields(product_id = %path.as_ref(), user_id = %auth_user.user_id))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<ProductId>,
  req: HttpRequest,
  body: Bytes,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let form = read_product_form(&req, body).await?;
  update_product(&app_state, path.into_inner(), auth_user.user_id, form.payload).await
}

/// Browser forms only POST; the hidden `_method` field picks update or delete.
#[instrument(name = "handler::post_product_form", skip(app_state, path, req, body, auth_user), fields(product_id = %path.as_ref(), user_id = %auth_user.user_id))]
pub async fn post_product_form_handler(
  app_state: web::Data<AppState>,
  path: web::Path<ProductId>,
  req: HttpRequest,
  body: Bytes,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let form = read_product_form(&req, body).await?;
  match form.method()? {
    FormMethod::Update => update_product(&app_state, path.into_inner(), auth_user.user_id, form.payload).await,
    FormMethod::Delete => destroy_product(&app_state, path.into_inner(), auth_user.user_id).await,
  }
}

#[instrument(name = "handler::delete_product", skip(app_state, path, auth_user), fields(product_id = %path.as_ref(), user_id = %auth_user.user_id))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<ProductId>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  destroy_product(&app_state, path.into_inner(), auth_user.user_id).await
}

async fn update_product(
  app_state: &AppState,
  product_id: ProductId,
  caller: UserId,
  payload: ProductPayload,
) -> Result<HttpResponse, AppError> {
  let outcome = app_state.catalog.update(product_id, caller, payload).await?;
  info!(previous_image = ?outcome.previous_image, "Product updated via HTTP.");
  Ok(redirect_to_listing(FlashMessage::Updated))
}

async fn destroy_product(app_state: &AppState, product_id: ProductId, caller: UserId) -> Result<HttpResponse, AppError> {
  let outcome = app_state.catalog.destroy(product_id, caller).await?;
  info!(image = ?outcome.image, "Product deleted via HTTP.");
  Ok(redirect_to_listing(FlashMessage::Deleted))
}
