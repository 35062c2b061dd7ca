use rusqlite::{params, ToSql};
use color_eyre::Result;
use super::entities::Role;
use super::mappers::{map_role, ROLE_FIELDS};
use super::helpers::{generate_field_like_qmark, like_pattern, bool_to_i32};
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

pub fn role_by_id(
  pool: &Pool,
  role_id: i64
) -> Result<Option<Role>> {
  select_one(
    pool,
    &format!("SELECT {} FROM roles WHERE roles.id = ?", ROLE_FIELDS),
    params![role_id],
    map_role
  )
}

pub fn role_by_title(
  pool: &Pool,
  title: &str
) -> Result<Option<Role>> {
  select_one(
    pool,
    &format!("SELECT {} FROM roles WHERE roles.title = ?", ROLE_FIELDS),
    params![title],
    map_role
  )
}

// Used for the uniqueness check, excluding the row being
// updated if any.
pub fn role_title_taken(
  pool: &Pool,
  title: &str,
  except_id: Option<i64>
) -> Result<bool> {
  let count = select_count(
    pool,
    "SELECT count(*) FROM roles WHERE title = ? AND id != ?",
    params![title, except_id.unwrap_or(-1)]
  )?;
  Ok(count > 0)
}

pub fn insert_role(
  pool: &Pool,
  title: &str
) -> Result<i64> {
  insert(
    pool,
    "INSERT INTO roles (title, is_archived) VALUES (?, 0)",
    params![title]
  )
}

pub fn update_role_title(
  pool: &Pool,
  role_id: i64,
  title: &str
) -> Result<usize> {
  execute(
    pool,
    "UPDATE roles SET title = ? WHERE id = ?",
    params![title, role_id]
  )
}

pub fn set_role_archived(
  pool: &Pool,
  role_id: i64,
  is_archived: bool
) -> Result<usize> {
  execute(
    pool,
    "UPDATE roles SET is_archived = ? WHERE id = ?",
    params![bool_to_i32(is_archived), role_id]
  )
}

pub fn roles_page(
  pool: &Pool,
  search: Option<&str>,
  number: usize,
  per_page: usize
) -> Result<Option<Page<Role>>> {
  let mut count_query = Query::count("roles");
  let mut select_query = Query::select(ROLE_FIELDS, "roles")
    .order(OrderBy::new(Order::Asc, "roles.title"));
  let pattern = search.map(like_pattern);
  let mut query_params: Vec<&dyn ToSql> = Vec::new();
  if let Some(p) = &pattern {
    let clause = generate_field_like_qmark("roles.title");
    count_query = count_query.where_clause(&clause);
    select_query = select_query.where_clause(&clause);
    query_params.push(p);
  }
  paginate(pool, count_query, select_query, &query_params, number, per_page, map_role)
}
