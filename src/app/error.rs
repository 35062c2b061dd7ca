use actix_web::{
  error::ResponseError,
  HttpResponse
};
use std::convert::From;
use derive_more::Display;
use log::error;
use crate::error::{StoreError, ValidationError};
use super::dtos::JsonStatus;

// The full cause of internal errors only goes to the logs,
// random internet people get the short version.
#[derive(Debug, Display)]
pub enum Error {
  #[display(fmt = "Internal Server Error")]
  InternalServerError(String),
  #[display(fmt = "Database Error")]
  DatabaseError(String),
  #[display(fmt = "Forbidden: {}", _0)]
  Forbidden(String),
  #[display(fmt = "Not Found: {}", _0)]
  NotFound(String),
  #[display(fmt = "Too Many Requests")]
  TooManyRequests,
  #[display(fmt = "{}", _0)]
  Validation(ValidationError)
}

// Plain text for everything except validation errors, the
// admin client needs the field name.
impl ResponseError for Error {
  fn error_response(&self) -> HttpResponse {
    match self {
      Error::InternalServerError(_) | Error::DatabaseError(_) =>
        HttpResponse::InternalServerError().body(self.to_string()),
      Error::Forbidden(_) => HttpResponse::Forbidden().body(self.to_string()),
      Error::NotFound(_) => HttpResponse::NotFound().body(self.to_string()),
      Error::TooManyRequests => HttpResponse::TooManyRequests().body(self.to_string()),
      Error::Validation(e) => HttpResponse::BadRequest().json(JsonStatus::from(e))
    }
  }
}

// Store errors have already been logged if they came from
// the database.
impl From<StoreError> for Error {
  fn from(e: StoreError) -> Self {
    match e {
      StoreError::Validation(v) => Error::Validation(v),
      StoreError::NotFound(what) => Error::NotFound(format!("{} does not exist", what)),
      StoreError::Database(message) => Error::DatabaseError(message),
      StoreError::Internal(message) => {
        error!("Internal error - {}", message);
        Error::InternalServerError(message)
      }
    }
  }
}

impl From<ValidationError> for Error {
  fn from(e: ValidationError) -> Self {
    Error::Validation(e)
  }
}
