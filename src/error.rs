use derive_more::Display;
use log::error;
use std::fmt;

// Errors raised by the stores before anything gets written.
// Every variant carries the name of the offending field so
// the admin surface can point at it.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum ValidationError {
  #[display(fmt = "{}: this field is required", _0)]
  MissingField(&'static str),
  #[display(fmt = "{}: \"{}\" is already taken", field, value)]
  UniquenessViolation { field: &'static str, value: String },
  #[display(fmt = "{}: {}", field, message)]
  RangeViolation { field: &'static str, message: String },
  #[display(fmt = "{}: {}", field, message)]
  FormatViolation { field: &'static str, message: String },
  #[display(fmt = "{}: cannot be empty", _0)]
  ContentEmpty(&'static str)
}

impl std::error::Error for ValidationError {}

impl ValidationError {
  pub fn field(&self) -> &'static str {
    match self {
      ValidationError::MissingField(field) => *field,
      ValidationError::UniquenessViolation { field, .. } => *field,
      ValidationError::RangeViolation { field, .. } => *field,
      ValidationError::FormatViolation { field, .. } => *field,
      ValidationError::ContentEmpty(field) => *field
    }
  }

  pub fn range(field: &'static str, message: &str) -> Self {
    ValidationError::RangeViolation { field, message: message.to_string() }
  }

  pub fn format(field: &'static str, message: &str) -> Self {
    ValidationError::FormatViolation { field, message: message.to_string() }
  }

  pub fn taken(field: &'static str, value: &str) -> Self {
    ValidationError::UniquenessViolation { field, value: value.to_string() }
  }
}

#[derive(Debug, Display)]
pub enum StoreError {
  #[display(fmt = "Validation failed - {}", _0)]
  Validation(ValidationError),
  #[display(fmt = "{} not found", _0)]
  NotFound(&'static str),
  // The eyre report is flattened to a string here, the full
  // chain gets logged where the conversion happens.
  #[display(fmt = "Database error - {}", _0)]
  Database(String),
  #[display(fmt = "Internal error - {}", _0)]
  Internal(String)
}

impl std::error::Error for StoreError {}

impl From<ValidationError> for StoreError {
  fn from(e: ValidationError) -> Self {
    StoreError::Validation(e)
  }
}

pub type StoreResult<T> = Result<T, StoreError>;

// The db module returns eyre reports. This is the one place
// they get turned into StoreError.
pub trait OrDbError<T> {
  fn or_db_error(self) -> StoreResult<T>;
}

impl<T, E: fmt::Display> OrDbError<T> for Result<T, E> {
  fn or_db_error(self) -> StoreResult<T> {
    self.map_err(db_error)
  }
}

pub fn db_error<E: fmt::Display>(e: E) -> StoreError {
  let message = format!("{:#}", e);
  error!("Database operation failed - {}", message);
  StoreError::Database(message)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn validation_errors_are_field_tagged() {
    let e = ValidationError::range("date_of_birth", "too young");
    assert_eq!(e.field(), "date_of_birth");
    assert_eq!(e.to_string(), "date_of_birth: too young");
    assert_eq!(
      ValidationError::taken("login", "ivan").to_string(),
      "login: \"ivan\" is already taken"
    );
  }

  #[test]
  fn db_errors_are_flattened() {
    let r: Result<(), String> = Err(String::from("disk on fire"));
    match r.or_db_error() {
      Err(StoreError::Database(m)) => assert_eq!(m, "disk on fire"),
      other => panic!("Unexpected result {:?}", other)
    }
  }
}
