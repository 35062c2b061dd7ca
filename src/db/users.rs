use rusqlite::{params, ToSql};
use rusqlite::ffi::ErrorCode;
use color_eyre::Result;
use super::entities::{User, AccountStatus};
use super::mappers::{map_user, USER_FIELDS, USER_FROM, DATE_OF_BIRTH_FORMAT};
use super::helpers::{
  generate_field_equal_qmark,
  generate_field_like_qmark,
  like_pattern,
  bool_to_i32
};
use super::{
  Pool,
  Page,
  Query,
  Order,
  OrderBy,
  select_one,
  select_count,
  execute,
  insert,
  paginate
};

fn user_where(pool: &Pool, clause: &str, value: &dyn ToSql) -> Result<Option<User>> {
  select_one(
    pool,
    &format!("SELECT {} FROM {} WHERE {}", USER_FIELDS, USER_FROM, clause),
    &[value],
    map_user
  )
}

pub fn user_by_id(pool: &Pool, user_id: i64) -> Result<Option<User>> {
  user_where(pool, "users.id = ?", &user_id)
}

pub fn user_by_login(pool: &Pool, login: &str) -> Result<Option<User>> {
  user_where(pool, "users.login = ?", &login)
}

// Unique columns are only ever checked one at a time, the
// column name is never user input.
pub fn user_value_taken(
  pool: &Pool,
  column: UniqueUserColumn,
  value: &str,
  except_id: Option<i64>
) -> Result<bool> {
  let count = select_count(
    pool,
    &format!(
      "SELECT count(*) FROM users WHERE {} AND id != ?",
      generate_field_equal_qmark(column.name())
    ),
    params![value, except_id.unwrap_or(-1)]
  )?;
  Ok(count > 0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniqueUserColumn {
  Email,
  Login
}

impl UniqueUserColumn {
  pub fn name(self) -> &'static str {
    match self {
      UniqueUserColumn::Email => "email",
      UniqueUserColumn::Login => "login"
    }
  }
}

// Which unique column a failed write ran into, if that's
// why it failed. The pre-write check can lose a race, the
// UNIQUE constraints can't.
pub fn unique_user_violation(report: &color_eyre::Report) -> Option<UniqueUserColumn> {
  report.chain()
    .find_map(|e| e.downcast_ref::<rusqlite::Error>())
    .and_then(|e| match e {
      rusqlite::Error::SqliteFailure(failure, Some(message))
        if failure.code == ErrorCode::ConstraintViolation => {
        if message.contains("users.email") {
          Some(UniqueUserColumn::Email)
        } else if message.contains("users.login") {
          Some(UniqueUserColumn::Login)
        } else {
          None
        }
      },
      _ => None
    })
}

// The ID of the given user is ignored, the new one is returned.
pub fn insert_user(pool: &Pool, user: &User) -> Result<i64> {
  insert(
    pool,
    "INSERT INTO users (name, email, login, date_of_birth, role_id, \
      password, is_active, is_staff, is_superuser, is_archived) \
      VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    params![
      user.name,
      user.email,
      user.login,
      user.date_of_birth.format(DATE_OF_BIRTH_FORMAT).to_string(),
      user.role_id,
      user.password,
      bool_to_i32(user.status.is_active()),
      bool_to_i32(user.is_staff),
      bool_to_i32(user.is_superuser),
      bool_to_i32(user.status.is_archived())
    ]
  )
}

// Writes every editable column. last_login is left alone,
// it has its own function.
pub fn update_user(pool: &Pool, user: &User) -> Result<usize> {
  execute(
    pool,
    "UPDATE users SET name = ?, email = ?, login = ?, date_of_birth = ?, \
      role_id = ?, password = ?, is_active = ?, is_staff = ?, \
      is_superuser = ?, is_archived = ? WHERE id = ?",
    params![
      user.name,
      user.email,
      user.login,
      user.date_of_birth.format(DATE_OF_BIRTH_FORMAT).to_string(),
      user.role_id,
      user.password,
      bool_to_i32(user.status.is_active()),
      bool_to_i32(user.is_staff),
      bool_to_i32(user.is_superuser),
      bool_to_i32(user.status.is_archived()),
      user.id
    ]
  )
}

// Both flags in one statement, they can't disagree.
pub fn set_user_status(
  pool: &Pool,
  user_id: i64,
  status: AccountStatus
) -> Result<usize> {
  execute(
    pool,
    "UPDATE users SET is_archived = ?, is_active = ? WHERE id = ?",
    params![
      bool_to_i32(status.is_archived()),
      bool_to_i32(status.is_active()),
      user_id
    ]
  )
}

pub fn set_user_password(
  pool: &Pool,
  user_id: i64,
  password_hash: &str
) -> Result<usize> {
  execute(
    pool,
    "UPDATE users SET password = ? WHERE id = ?",
    params![password_hash, user_id]
  )
}

pub fn set_user_last_login(
  pool: &Pool,
  user_id: i64,
  timestamp: i64
) -> Result<usize> {
  execute(
    pool,
    "UPDATE users SET last_login = ? WHERE id = ?",
    params![timestamp, user_id]
  )
}

pub fn users_page(
  pool: &Pool,
  search: Option<&str>,
  role_id: Option<i64>,
  number: usize,
  per_page: usize
) -> Result<Option<Page<User>>> {
  let mut count_query = Query::count(USER_FROM);
  let mut select_query = Query::select(USER_FIELDS, USER_FROM)
    .order(OrderBy::new(Order::Asc, "users.name"))
    .order(OrderBy::new(Order::Asc, "users.id"));
  let pattern = search.map(like_pattern);
  let mut query_params: Vec<&dyn ToSql> = Vec::new();
  if let Some(p) = &pattern {
    let clauses: Vec<String> = ["users.name", "users.email", "users.login"]
      .iter()
      .map(|f| generate_field_like_qmark(f))
      .collect();
    let clauses: Vec<&str> = clauses.iter().map(String::as_str).collect();
    count_query = count_query.where_or(&clauses);
    select_query = select_query.where_or(&clauses);
    query_params.push(p);
    query_params.push(p);
    query_params.push(p);
  }
  if let Some(role_id) = &role_id {
    count_query = count_query.where_clause("users.role_id = ?");
    select_query = select_query.where_clause("users.role_id = ?");
    query_params.push(role_id);
  }
  paginate(pool, count_query, select_query, &query_params, number, per_page, map_user)
}
