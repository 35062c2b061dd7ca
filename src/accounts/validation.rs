use chrono::NaiveDate;
use regex::Regex;
use lazy_static::lazy_static;
use crate::error::ValidationError;
use crate::utils::time_utils::age_on;

pub const MIN_AGE: i32 = 16;
pub const MAX_AGE: i32 = 100;
pub const NAME_MAX_LENGTH: usize = 20;
pub const EMAIL_MAX_LENGTH: usize = 50;
pub const LOGIN_MAX_LENGTH: usize = 25;
pub const ROLE_TITLE_MIN_LENGTH: usize = 3;
pub const ROLE_TITLE_MAX_LENGTH: usize = 20;

lazy_static! {
  static ref CYRILLIC_REGEX: Regex = Regex::new(r"\p{Cyrillic}").unwrap();
  // Not trying to be RFC compliant, just "something@something.tld".
  static ref EMAIL_REGEX: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub fn validate_age(date_of_birth: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
  let age = age_on(date_of_birth, today);
  if age < 0 || age > MAX_AGE {
    return Err(ValidationError::range(
      "date_of_birth",
      &format!("age must be between 0 and {} years", MAX_AGE)
    ));
  }
  if age < MIN_AGE {
    return Err(ValidationError::range(
      "date_of_birth",
      &format!("user must be at least {} years old", MIN_AGE)
    ));
  }
  Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
  validate_not_blank("name", name)?;
  validate_max_length("name", name, NAME_MAX_LENGTH)?;
  if !CYRILLIC_REGEX.is_match(name) {
    return Err(ValidationError::format(
      "name",
      "must contain Cyrillic letters"
    ));
  }
  Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
  validate_not_blank("email", email)?;
  validate_max_length("email", email, EMAIL_MAX_LENGTH)?;
  if !EMAIL_REGEX.is_match(email) {
    return Err(ValidationError::format("email", "enter a valid email address"));
  }
  Ok(())
}

pub fn validate_login(login: &str) -> Result<(), ValidationError> {
  validate_not_blank("login", login)?;
  validate_max_length("login", login, LOGIN_MAX_LENGTH)
}

pub fn validate_raw_password(password: &str) -> Result<(), ValidationError> {
  if password.is_empty() {
    return Err(ValidationError::ContentEmpty("password"));
  }
  Ok(())
}

pub fn validate_role_title(title: &str) -> Result<(), ValidationError> {
  let length = title.chars().count();
  if length < ROLE_TITLE_MIN_LENGTH {
    return Err(ValidationError::range(
      "title",
      &format!("must be at least {} characters long", ROLE_TITLE_MIN_LENGTH)
    ));
  }
  validate_max_length("title", title, ROLE_TITLE_MAX_LENGTH)
}

pub fn validate_not_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
  if value.trim().is_empty() {
    Err(ValidationError::ContentEmpty(field))
  } else {
    Ok(())
  }
}

fn validate_max_length(
  field: &'static str,
  value: &str,
  max: usize
) -> Result<(), ValidationError> {
  if value.chars().count() > max {
    Err(ValidationError::range(
      field,
      &format!("must be at most {} characters long", max)
    ))
  } else {
    Ok(())
  }
}

// Dates of birth come in as YYYY-MM-DD from the admin API
// and the command line.
pub fn parse_date_of_birth(value: &str) -> Result<NaiveDate, ValidationError> {
  NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
    .map_err(|_| ValidationError::format("date_of_birth", "expected a YYYY-MM-DD date"))
}

// Lowercases the domain part only, the local part is case
// sensitive in theory.
pub fn normalize_email(email: &str) -> String {
  let email = email.trim();
  match email.rfind('@') {
    Some(idx) => format!("{}{}", &email[..idx], email[idx..].to_lowercase()),
    None => email.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd(y, m, d)
  }

  #[test]
  fn age_bounds() {
    let today = date(2026, 10, 18);
    assert!(validate_age(date(2010, 10, 18), today).is_ok());
    assert!(validate_age(date(1926, 10, 18), today).is_ok());
    // 15 years old:
    assert_eq!(
      validate_age(date(2010, 10, 19), today).unwrap_err().field(),
      "date_of_birth"
    );
    // 101 years old:
    match validate_age(date(1925, 10, 18), today) {
      Err(ValidationError::RangeViolation { field, .. }) => assert_eq!(field, "date_of_birth"),
      other => panic!("Expected a range violation, got {:?}", other)
    }
  }

  #[test]
  fn future_birth_date_is_rejected() {
    let today = date(2026, 10, 18);
    assert!(matches!(
      validate_age(date(2027, 1, 1), today),
      Err(ValidationError::RangeViolation { .. })
    ));
  }

  #[test]
  fn names_need_cyrillic() {
    assert!(validate_name("Иван").is_ok());
    assert!(validate_name("Ivan Ёж").is_ok());
    assert_eq!(
      validate_name("John"),
      Err(ValidationError::format("name", "must contain Cyrillic letters"))
    );
  }

  #[test]
  fn name_length_counts_chars() {
    // 20 Cyrillic chars is 40 bytes but still valid:
    assert!(validate_name("Абвгдеёжзийклмнопрст").is_ok());
    assert!(validate_name("Абвгдеёжзийклмнопрсту").is_err());
  }

  #[test]
  fn email_format() {
    assert!(validate_email("ivan@example.ru").is_ok());
    assert!(validate_email("ivan.example.ru").is_err());
    assert!(validate_email("ivan@example").is_err());
    assert_eq!(validate_email("  "), Err(ValidationError::ContentEmpty("email")));
  }

  #[test]
  fn email_domain_is_lowercased() {
    assert_eq!(normalize_email(" Ivan@Example.RU "), "Ivan@example.ru");
    assert_eq!(normalize_email("not-an-email"), "not-an-email");
  }

  #[test]
  fn role_titles() {
    assert!(validate_role_title("Client").is_ok());
    assert!(validate_role_title("Ад").is_err());
    assert!(validate_role_title("Абв").is_ok());
    assert!(validate_role_title("a very long role title here").is_err());
  }

  #[test]
  fn empty_password_is_rejected() {
    assert_eq!(validate_raw_password(""), Err(ValidationError::ContentEmpty("password")));
    assert!(validate_raw_password("x").is_ok());
  }

  #[test]
  fn dates_of_birth_are_parsed() {
    assert_eq!(parse_date_of_birth(" 1990-03-08 ").unwrap(), date(1990, 3, 8));
    assert_eq!(
      parse_date_of_birth("08/03/1990").unwrap_err().field(),
      "date_of_birth"
    );
  }
}
