// app/src/config.rs

use crate::errors::{AppError, Result};
use anuncios::validation::DEFAULT_MAX_IMAGE_KB;
use anuncios::{ImagePolicy, ValidationRules};
use dotenvy::dotenv;
use std::env;
use url::Url;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  /// `file:///…` for a local directory, `memory:///` for a throwaway store.
  pub blob_store_url: String,
  pub max_image_kb: u64,
  pub keep_image_on_update: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL").unwrap_or_else(|_| "sqlite://anuncios.db?mode=rwc".to_string());
    let blob_store_url = match get_env("BLOB_STORE_URL") {
      Ok(url) => url,
      Err(_) => default_blob_store_url()?,
    };
    let max_image_kb = get_env("MAX_IMAGE_KB")
      .unwrap_or_else(|_| DEFAULT_MAX_IMAGE_KB.to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid MAX_IMAGE_KB: {}", e)))?;
    let keep_image_on_update = get_env("KEEP_IMAGE_ON_UPDATE")
      .unwrap_or_else(|_| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid KEEP_IMAGE_ON_UPDATE value: {}", e)))?;

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      blob_store_url,
      max_image_kb,
      keep_image_on_update,
    })
  }

  pub fn validation_rules(&self) -> ValidationRules {
    ValidationRules {
      max_image_kb: self.max_image_kb,
      image_policy: if self.keep_image_on_update {
        ImagePolicy::KeepExisting
      } else {
        ImagePolicy::RequireOnUpdate
      },
    }
  }

  /// Request bodies may exceed the image limit so that an oversized image
  /// still reaches validation and gets a field error instead of a 413.
  pub fn max_body_bytes(&self) -> usize {
    let image_bytes = self.max_image_kb.saturating_mul(1024);
    usize::try_from(image_bytes.saturating_mul(4)).unwrap_or(usize::MAX).saturating_add(1024 * 1024)
  }
}

fn default_blob_store_url() -> Result<String> {
  let cwd = env::current_dir().map_err(|e| AppError::Config(format!("Cannot resolve working directory: {}", e)))?;
  let url = Url::from_directory_path(cwd.join("storage"))
    .map_err(|_| AppError::Config(format!("Cannot build a file URL for {}", cwd.display())))?;
  Ok(url.to_string())
}
