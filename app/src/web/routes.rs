// app/src/web/routes.rs

use crate::web::handlers::{product_handlers, storage_handlers};
use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/health", web::get().to(health_check_handler))
    .service(
      web::scope("/products")
        .route("", web::get().to(product_handlers::list_products_handler))
        .route("", web::post().to(product_handlers::create_product_handler))
        // Registered before "/{product_id}" so "create" is not read as an id.
        .route("/create", web::get().to(product_handlers::create_form_handler))
        .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
        .route("/{product_id}", web::put().to(product_handlers::update_product_handler))
        .route("/{product_id}", web::post().to(product_handlers::post_product_form_handler))
        .route("/{product_id}", web::delete().to(product_handlers::delete_product_handler))
        .route("/{product_id}/edit", web::get().to(product_handlers::edit_product_handler))
        .route("/{product_id}/delete", web::post().to(product_handlers::delete_product_handler)),
    )
    .route("/storage/{key:.*}", web::get().to(storage_handlers::serve_blob_handler));
}
