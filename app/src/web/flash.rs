// app/src/web/flash.rs

//! One-shot status messages carried across a redirect in a `flash` cookie.
//! The cookie holds a short ASCII code; the listing turns it back into text
//! and clears it.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;
use anuncios::OwnerAction;

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashMessage {
  Created,
  Updated,
  Deleted,
  EditDenied,
  DeleteDenied,
}

impl FlashMessage {
  pub fn denied(action: OwnerAction) -> Self {
    match action {
      OwnerAction::Edit => FlashMessage::EditDenied,
      OwnerAction::Delete => FlashMessage::DeleteDenied,
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      FlashMessage::Created => "created",
      FlashMessage::Updated => "updated",
      FlashMessage::Deleted => "deleted",
      FlashMessage::EditDenied => "edit-denied",
      FlashMessage::DeleteDenied => "delete-denied",
    }
  }

  pub fn from_code(code: &str) -> Option<Self> {
    match code {
      "created" => Some(FlashMessage::Created),
      "updated" => Some(FlashMessage::Updated),
      "deleted" => Some(FlashMessage::Deleted),
      "edit-denied" => Some(FlashMessage::EditDenied),
      "delete-denied" => Some(FlashMessage::DeleteDenied),
      _ => None,
    }
  }

  pub fn is_error(&self) -> bool {
    matches!(self, FlashMessage::EditDenied | FlashMessage::DeleteDenied)
  }

  pub fn text(&self) -> &'static str {
    match self {
      FlashMessage::Created => "Anuncio creado correctamente",
      FlashMessage::Updated => "Anuncio actualizado correctamente",
      FlashMessage::Deleted => "Producto eliminado correctamente",
      FlashMessage::EditDenied => OwnerAction::Edit.denial_message(),
      FlashMessage::DeleteDenied => OwnerAction::Delete.denial_message(),
    }
  }

  pub fn cookie(&self) -> Cookie<'static> {
    Cookie::build(FLASH_COOKIE, self.code())
      .path("/")
      .http_only(true)
      .same_site(SameSite::Lax)
      .max_age(Duration::minutes(5))
      .finish()
  }

  /// Reads the pending message, if any, from the request.
  pub fn pending(req: &HttpRequest) -> Option<Self> {
    req.cookie(FLASH_COOKIE).and_then(|c| Self::from_code(c.value()))
  }

  /// A cookie that clears the pending message.
  pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(FLASH_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
  }
}
