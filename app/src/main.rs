// app/src/main.rs

mod config;
mod errors;
mod state;
mod web;

use crate::config::AppConfig;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use anuncios::{ObjectBlobStore, ProductService, SqliteProductRepository};
use anyhow::Context;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
  let builder = tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::CLOSE);

  // LOG_FORMAT=json for log shippers; human-readable otherwise.
  if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
    builder.json().init();
  } else {
    builder.init();
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();
  init_tracing();

  tracing::info!("Starting anuncios server...");

  let app_config = Arc::new(AppConfig::from_env().context("loading configuration")?);

  let repo = SqliteProductRepository::connect(&app_config.database_url)
    .await
    .context("connecting to the database")?;
  repo.migrate().await.context("applying database migrations")?;
  tracing::info!("Database ready.");

  let blobs = Arc::new(ObjectBlobStore::from_url(&app_config.blob_store_url).context("configuring the blob store")?);

  let catalog = Arc::new(ProductService::new(
    Arc::new(repo),
    blobs.clone(),
    app_config.validation_rules(),
  ));

  let app_state = AppState { catalog, blobs };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  let max_body_bytes = app_config.max_body_bytes();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .app_data(actix_data::PayloadConfig::new(max_body_bytes))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await?;

  Ok(())
}
