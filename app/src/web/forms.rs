// app/src/web/forms.rs

//! Reads the create/update form (`multipart/form-data`, or url-encoded when
//! no file is sent) into a `ProductPayload`. Presence and format checks are
//! left to the validator.

use crate::errors::AppError;
use actix_web::http::header;
use actix_web::HttpRequest;
use anuncios::{ImageUpload, ProductPayload};
use bytes::{Bytes, BytesMut};
use std::convert::Infallible;
use tracing::debug;

/// The verb a browser form asks for through its hidden `_method` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
  Update,
  Delete,
}

impl FormMethod {
  fn from_field(value: Option<&str>) -> Result<Self, AppError> {
    match value.map(str::trim) {
      None | Some("") => Ok(FormMethod::Update),
      Some(m) if m.eq_ignore_ascii_case("PUT") || m.eq_ignore_ascii_case("PATCH") => Ok(FormMethod::Update),
      Some(m) if m.eq_ignore_ascii_case("DELETE") => Ok(FormMethod::Delete),
      Some(other) => Err(AppError::BadRequest(format!("Unsupported form method '{}'", other))),
    }
  }
}

#[derive(Debug, Default)]
pub struct ProductForm {
  pub method: Option<String>,
  pub payload: ProductPayload,
}

impl ProductForm {
  pub fn method(&self) -> Result<FormMethod, AppError> {
    FormMethod::from_field(self.method.as_deref())
  }

  fn set_text(&mut self, name: &str, value: String) {
    match name {
      "title" => self.payload.title = Some(value),
      "description" => self.payload.description = Some(value),
      "price" => self.payload.price = Some(value),
      "_method" => self.method = Some(value),
      // _token and anything else a browser form sends along
      _ => {}
    }
  }
}

pub async fn read_product_form(req: &HttpRequest, body: Bytes) -> Result<ProductForm, AppError> {
  let content_type = req
    .headers()
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| AppError::BadRequest("Expected a form body".to_string()))?;

  if content_type.starts_with("application/x-www-form-urlencoded") {
    let mut form = ProductForm::default();
    for (name, value) in url::form_urlencoded::parse(&body) {
      form.set_text(&name, value.into_owned());
    }
    return Ok(form);
  }

  let boundary = multer::parse_boundary(content_type).map_err(|e| AppError::BadRequest(e.to_string()))?;

  let stream = futures_util::stream::once(async move { Ok::<Bytes, Infallible>(body) });
  let mut multipart = multer::Multipart::new(stream, boundary);
  let mut form = ProductForm::default();

  while let Some(mut field) = multipart.next_field().await.map_err(bad_form)? {
    let name = field.name().unwrap_or_default().to_string();
    match name.as_str() {
      "image" => {
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(|m| m.essence_str().to_string());
        let mut bytes = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(bad_form)? {
          bytes.extend_from_slice(&chunk);
        }
        debug!(size = bytes.len(), ?file_name, ?content_type, "Image part received.");
        form.payload.image = Some(ImageUpload {
          file_name,
          content_type,
          size: bytes.len() as u64,
          bytes: bytes.freeze(),
        });
      }
      _ => {
        let value = field.text().await.map_err(bad_form)?;
        form.set_text(&name, value);
      }
    }
  }

  Ok(form)
}

fn bad_form(err: multer::Error) -> AppError {
  AppError::BadRequest(format!("Malformed form data: {}", err))
}
