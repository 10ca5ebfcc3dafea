// app/src/web/auth.rs

use crate::errors::AppError;
use actix_web::{FromRequest, HttpRequest};
use anuncios::UserId;
use tracing::warn;

pub const USER_ID_HEADER: &str = "X-User-ID";

/// The caller, as identified by the authentication layer in front of this
/// service. Placeholder: the id is taken from the `X-User-ID` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: UserId,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let user_id = req
      .headers()
      .get(USER_ID_HEADER)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| value.trim().parse::<UserId>().ok());

    match user_id {
      Some(user_id) => futures_util::future::ready(Ok(AuthenticatedUser { user_id })),
      None => {
        warn!("AuthenticatedUser extractor: Missing or invalid X-User-ID header.");
        futures_util::future::ready(Err(AppError::Auth(
          "User authentication required. Missing or invalid X-User-ID header.".to_string(),
        )))
      }
    }
  }
}
