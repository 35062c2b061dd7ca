/*
 * Accounts: roles, users, passwords and sessions.
 *
 * Every user write goes through UserAccountManager::persist,
 * which is where the default role and the password hashing
 * rules are applied.
 */

use chrono::NaiveDate;
use log::{debug, info};
use crate::db::{self, Pool, Page, UniqueUserColumn};
use crate::db::entities::{AccountStatus, User};
use crate::error::{db_error, StoreError, StoreResult, OrDbError, ValidationError};
use crate::utils::time_utils;
pub mod password;
pub mod roles;
pub mod sessions;
pub mod validation;
use roles::{RoleResolver, RoleRegistry, DEFAULT_ROLE, ADMIN_ROLE};
use validation::*;

// Input of the account creation entry points. Everything is
// optional so that missing fields can be reported by name.
#[derive(Debug, Default, Clone)]
pub struct NewUser {
  pub email: Option<String>,
  pub password: Option<String>,
  pub name: Option<String>,
  pub date_of_birth: Option<NaiveDate>,
  pub login: Option<String>,
  pub role_id: Option<i64>
}

// What the admin form can change. None means "leave as is".
// role_id uses a double Option: Some(None) clears the role.
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
  pub name: Option<String>,
  pub email: Option<String>,
  pub login: Option<String>,
  pub date_of_birth: Option<NaiveDate>,
  pub role_id: Option<Option<i64>>,
  // Raw password or an already hashed value.
  pub password: Option<String>,
  pub is_staff: Option<bool>,
  pub is_superuser: Option<bool>,
  // Only there because the admin form sends it, the active
  // flag always follows the archived flag.
  pub is_active: Option<bool>,
  pub is_archived: Option<bool>
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AccountKind {
  Regular,
  Privileged
}

#[derive(Clone)]
pub struct UserAccountManager<R: RoleResolver = RoleRegistry> {
  pool: Pool,
  roles: R
}

impl<R: RoleResolver> UserAccountManager<R> {

  pub fn new(pool: Pool, roles: R) -> Self {
    Self { pool, roles }
  }

  pub fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
    self.create(new_user, AccountKind::Regular)
  }

  // Staff + superuser, defaults to the Administrator role.
  pub fn create_superuser(&self, new_user: NewUser) -> StoreResult<User> {
    self.create(new_user, AccountKind::Privileged)
  }

  fn create(&self, new_user: NewUser, kind: AccountKind) -> StoreResult<User> {
    let email = required_text("email", new_user.email)?;
    let password = new_user.password
      .ok_or(ValidationError::MissingField("password"))?;
    let name = required_text("name", new_user.name)?;
    let date_of_birth = new_user.date_of_birth
      .ok_or(ValidationError::MissingField("date_of_birth"))?;
    let login = required_text("login", new_user.login)?;
    validate_raw_password(&password)?;

    let privileged = kind == AccountKind::Privileged;
    let mut user = User {
      id: -1,
      name: name.trim().to_string(),
      email: normalize_email(&email),
      login: login.trim().to_string(),
      date_of_birth,
      role_id: new_user.role_id,
      role_title: None,
      password,
      status: AccountStatus::Active,
      is_staff: privileged,
      is_superuser: privileged,
      last_login: None
    };
    self.validate(&user, None)?;

    // Only resolve default roles once we know the account is
    // valid, so a failed creation doesn't leave a new role behind.
    if user.role_id.is_none() {
      let title = if privileged { ADMIN_ROLE } else { DEFAULT_ROLE };
      user.role_id = Some(self.roles.resolve(title)?.id);
    }
    // Hash now so the raw value never reaches the database,
    // persist sees a hash and leaves it alone.
    user.password = password::hash_password(&user.password)?;
    let created = self.persist(user, None)?;
    info!("Created {} account {} ({})",
      if privileged { "privileged" } else { "regular" },
      created.login,
      created.id
    );
    Ok(created)
  }

  // The admin form save path.
  pub fn update(&self, user_id: i64, changes: UserChanges) -> StoreResult<User> {
    let prior = self.get(user_id)?;
    let mut user = prior.clone();
    if let Some(name) = changes.name {
      user.name = name.trim().to_string();
    }
    if let Some(email) = changes.email {
      user.email = normalize_email(&email);
    }
    if let Some(login) = changes.login {
      user.login = login.trim().to_string();
    }
    if let Some(date_of_birth) = changes.date_of_birth {
      user.date_of_birth = date_of_birth;
    }
    if let Some(role_id) = changes.role_id {
      user.role_id = role_id;
    }
    if let Some(password) = changes.password {
      validate_raw_password(&password)?;
      user.password = password;
    }
    if let Some(is_staff) = changes.is_staff {
      user.is_staff = is_staff;
    }
    if let Some(is_superuser) = changes.is_superuser {
      user.is_superuser = is_superuser;
    }
    if let Some(is_archived) = changes.is_archived {
      user.status = AccountStatus::from_archived_flag(is_archived);
    }
    if let Some(is_active) = changes.is_active {
      if is_active != user.status.is_active() {
        debug!("Ignoring active flag {} for user {}, account is {}",
          is_active, user_id, user.status);
      }
    }
    self.validate(&user, Some(user_id))?;
    self.persist(user, Some(&prior))
  }

  // Single place where defaults and hashing get applied before
  // a write. prior is the stored version of the account, if any.
  fn normalize_before_persist(
    &self,
    mut user: User,
    prior: Option<&User>
  ) -> StoreResult<User> {
    if user.role_id.is_none() && !user.is_superuser {
      // Role-less saves keep the stored password, whatever
      // came in with the form.
      if let Some(prior) = prior {
        user.password = prior.password.clone();
      }
      let role = self.roles.resolve(DEFAULT_ROLE)?;
      user.role_id = Some(role.id);
      user.role_title = Some(role.title);
    }
    if !password::is_password_hash(&user.password) {
      user.password = password::hash_password(&user.password)?;
    }
    Ok(user)
  }

  fn persist(&self, user: User, prior: Option<&User>) -> StoreResult<User> {
    let user = self.normalize_before_persist(user, prior)?;
    let written = match prior {
      Some(_) => db::update_user(&self.pool, &user).map(|_| user.id),
      None => db::insert_user(&self.pool, &user)
    };
    let user_id = written.map_err(|e| write_error(e, &user))?;
    self.get(user_id)
  }

  fn validate(&self, user: &User, except_id: Option<i64>) -> StoreResult<()> {
    validate_name(&user.name)?;
    validate_email(&user.email)?;
    validate_login(&user.login)?;
    validate_age(user.date_of_birth, time_utils::today())?;
    if let Some(role_id) = user.role_id {
      if self.roles.find(role_id)?.is_none() {
        return Err(ValidationError::format("role", "select a valid role").into());
      }
    }
    for (column, value) in &[
      (UniqueUserColumn::Email, &user.email),
      (UniqueUserColumn::Login, &user.login)
    ] {
      if db::user_value_taken(&self.pool, *column, value, except_id).or_db_error()? {
        return Err(ValidationError::taken(column.name(), value).into());
      }
    }
    Ok(())
  }

  // Soft delete. Flag flips don't go through validation.
  pub fn archive(&self, user_id: i64) -> StoreResult<User> {
    self.set_status(user_id, AccountStatus::Archived)
  }

  pub fn unarchive(&self, user_id: i64) -> StoreResult<User> {
    self.set_status(user_id, AccountStatus::Active)
  }

  fn set_status(&self, user_id: i64, status: AccountStatus) -> StoreResult<User> {
    let updated = db::set_user_status(&self.pool, user_id, status).or_db_error()?;
    if updated == 0 {
      return Err(StoreError::NotFound("User"));
    }
    info!("User {} is now {}", user_id, status);
    self.get(user_id)
  }

  pub fn set_password(&self, user_id: i64, raw_password: &str) -> StoreResult<User> {
    validate_raw_password(raw_password)?;
    let hash = password::hash_password(raw_password)?;
    let updated = db::set_user_password(&self.pool, user_id, &hash).or_db_error()?;
    if updated == 0 {
      return Err(StoreError::NotFound("User"));
    }
    self.get(user_id)
  }

  // Returns the account when the password matches and the
  // account is active. Also stamps last_login.
  pub fn authenticate(&self, login: &str, raw_password: &str) -> StoreResult<Option<User>> {
    let user = match db::user_by_login(&self.pool, login.trim()).or_db_error()? {
      Some(user) => user,
      None => return Ok(None)
    };
    if !user.is_active() || !password::verify_password(raw_password, &user.password) {
      return Ok(None);
    }
    db::set_user_last_login(&self.pool, user.id, time_utils::current_timestamp())
      .or_db_error()?;
    self.get(user.id).map(Some)
  }

  pub fn get(&self, user_id: i64) -> StoreResult<User> {
    db::user_by_id(&self.pool, user_id)
      .or_db_error()?
      .ok_or(StoreError::NotFound("User"))
  }

  pub fn by_login(&self, login: &str) -> StoreResult<User> {
    db::user_by_login(&self.pool, login)
      .or_db_error()?
      .ok_or(StoreError::NotFound("User"))
  }

  pub fn list(
    &self,
    search: Option<&str>,
    role_id: Option<i64>,
    page: usize,
    per_page: usize
  ) -> StoreResult<Option<Page<User>>> {
    db::users_page(&self.pool, search, role_id, page, per_page).or_db_error()
  }

}

// A UNIQUE failure here means another write got in between
// the check and ours, report it like the check would have.
fn write_error(e: color_eyre::Report, user: &User) -> StoreError {
  match db::unique_user_violation(&e) {
    Some(UniqueUserColumn::Email) => ValidationError::taken("email", &user.email).into(),
    Some(UniqueUserColumn::Login) => ValidationError::taken("login", &user.login).into(),
    None => db_error(e)
  }
}

fn required_text(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
  match value {
    Some(v) if !v.trim().is_empty() => Ok(v),
    _ => Err(ValidationError::MissingField(field))
  }
}
