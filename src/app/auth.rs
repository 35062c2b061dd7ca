use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use log::warn;
use crate::db::entities::User;
use super::error::Error;
use super::helpers;
use super::AppState;

// Extractor for the admin handlers. Having it in a handler
// signature is enough to require a live session belonging
// to an active staff account.
pub struct StaffUser(pub User);

impl FromRequest for StaffUser {
  type Error = Error;
  type Future = Ready<Result<Self, Self::Error>>;
  type Config = ();

  fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
    ready(staff_user(req))
  }
}

fn staff_user(req: &HttpRequest) -> Result<StaffUser, Error> {
  let app_state = req.app_data::<web::Data<AppState>>()
    .ok_or_else(|| Error::InternalServerError(String::from("Missing app state")))?;
  let token = match helpers::session_token(req) {
    Some(token) => token,
    None => {
      warn!("Admin access without a session to {}", req.path());
      return Err(Error::Forbidden(String::from("Login required")));
    }
  };
  match app_state.sessions.user_for_token(&token)? {
    Some(user) if user.is_active() && user.is_staff => Ok(StaffUser(user)),
    Some(user) => {
      warn!("User {} is not allowed in the admin ({})", user.login, req.path());
      Err(Error::Forbidden(String::from("Staff only")))
    },
    None => {
      warn!("Admin access with an unknown or expired session to {}", req.path());
      Err(Error::Forbidden(String::from("Login required")))
    }
  }
}
