use rusqlite::{Row, ToSql, NO_PARAMS};
use r2d2_sqlite::SqliteConnectionManager;
use eyre::WrapErr;
use color_eyre::Result;
use serde::Serialize;
use std::convert::TryInto;
pub mod entities;
pub mod helpers;
pub mod queries;
mod mappers;
mod roles;
mod users;
mod news;
mod pictures;
mod view_counts;
mod sessions;
pub use queries::{Query, Order, OrderBy};
pub use roles::*;
pub use users::*;
pub use news::*;
pub use pictures::*;
pub use view_counts::*;
pub use sessions::*;

// Type alias to make function signatures much clearer:
pub type Pool = r2d2::Pool<SqliteConnectionManager>;

const SCHEMA: &'static str = include_str!("schema.sql");

/**
 * All the DB stuff is done in a non-async way. The
 * handlers call these directly.
 */

pub fn open_pool(db_path: &str) -> Result<Pool> {
  // SQLite has foreign keys disabled by default, and it's
  // a per-connection setting.
  let manager = SqliteConnectionManager::file(db_path)
    .with_init(|c| c.execute_batch("PRAGMA foreign_keys = ON;"));
  Pool::new(manager)
    .wrap_err_with(|| format!("Opening database at {}", db_path))
}

// Every in-memory connection is its own database, so the
// pool has to be limited to a single connection.
#[cfg(test)]
pub fn memory_pool() -> Pool {
  let manager = SqliteConnectionManager::memory()
    .with_init(|c| c.execute_batch("PRAGMA foreign_keys = ON;"));
  let pool = r2d2::Pool::builder()
    .max_size(1)
    .build(manager)
    .expect("In-memory database should open");
  migrate(&pool).expect("Schema should apply to an empty database");
  pool
}

pub fn migrate(pool: &Pool) -> Result<()> {
  let conn = pool.get()?;
  conn.execute_batch(SCHEMA)
    .wrap_err("Applying database schema")
}

// Stole most of the signature from the rusqlite doc.
fn select_many<T, P, F>(
  pool: &Pool,
  query: &str,
  params: P,
  mapper: F
) -> Result<Vec<T>>
  where
    P: IntoIterator,
    P::Item: ToSql,
    F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  let conn = pool.get()?;
  let mut stmt = conn.prepare(query)?;
  stmt.query_map(params, mapper)
    .and_then(Iterator::collect)
    .wrap_err("Generic select_many query")
}

// Same thing but for a single optional row.
fn select_one<T, P, F>(
  pool: &Pool,
  query: &str,
  params: P,
  mapper: F
) -> Result<Option<T>>
  where
    P: IntoIterator,
    P::Item: ToSql,
    F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  let mut rows = select_many(pool, query, params, mapper)?;
  if rows.is_empty() {
    Ok(None)
  } else {
    Ok(Some(rows.swap_remove(0)))
  }
}

fn select_count<P>(
  pool: &Pool,
  query: &str,
  params: P
) -> Result<i64>
  where
    P: IntoIterator,
    P::Item: ToSql,
{
  let conn = pool.get()?;
  let count: i64 = conn.query_row(query, params, |row| row.get(0))
    .wrap_err("Generic count query")?;
  Ok(count)
}

// Returns the amount of rows modified.
fn execute<P>(
  pool: &Pool,
  query: &str,
  params: P
) -> Result<usize>
  where
    P: IntoIterator,
    P::Item: ToSql,
{
  let conn = pool.get()?;
  conn.execute(query, params)
    .wrap_err("Generic execute query")
}

// Runs an INSERT and gives back the new row ID.
fn insert<P>(
  pool: &Pool,
  query: &str,
  params: P
) -> Result<i64>
  where
    P: IntoIterator,
    P::Item: ToSql,
{
  let conn = pool.get()?;
  conn.execute(query, params)
    .wrap_err("Generic insert query")?;
  Ok(conn.last_insert_rowid())
}

pub fn table_row_count(pool: &Pool, table: Table) -> Result<i64> {
  select_count(
    pool,
    &Query::count(table.name()).to_string(),
    NO_PARAMS
  )
}

// Tables that can be counted from outside, the name is
// never user input.
#[derive(Debug, Clone, Copy)]
pub enum Table {
  Roles,
  Users,
  News,
  Pictures,
  ViewCounts
}

impl Table {
  fn name(self) -> &'static str {
    match self {
      Table::Roles => "roles",
      Table::Users => "users",
      Table::News => "news",
      Table::Pictures => "pictures",
      Table::ViewCounts => "view_counts"
    }
  }
}

/* --- Pagination --- */

// Page numbers start at 1. An empty table still has one
// (empty) page.
#[derive(Debug, Serialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub number: usize,
  pub per_page: usize,
  pub total: usize,
  pub num_pages: usize
}

impl<T> Page<T> {
  pub fn has_previous(&self) -> bool {
    self.number > 1
  }

  pub fn has_next(&self) -> bool {
    self.number < self.num_pages
  }

  pub fn map<U, F>(self, f: F) -> Page<U>
    where F: FnMut(T) -> U
  {
    Page {
      items: self.items.into_iter().map(f).collect(),
      number: self.number,
      per_page: self.per_page,
      total: self.total,
      num_pages: self.num_pages
    }
  }
}

pub fn num_pages(total: usize, per_page: usize) -> usize {
  if total == 0 || per_page == 0 {
    1
  } else {
    (total + per_page - 1) / per_page
  }
}

// Runs the count query then the select query with the right
// LIMIT and OFFSET. Both queries use the same parameters.
// Returns None when the page number is out of range.
fn paginate<T, F>(
  pool: &Pool,
  count_query: Query,
  select_query: Query,
  params: &[&dyn ToSql],
  number: usize,
  per_page: usize,
  mapper: F
) -> Result<Option<Page<T>>>
  where F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>
{
  let total: usize = select_count(pool, &count_query.to_string(), params)?
    .try_into()
    .wrap_err("Row count does not fit in usize")?;
  let num_pages = num_pages(total, per_page);
  if number < 1 || number > num_pages {
    return Ok(None);
  }
  let offset = (number - 1) * per_page;
  let query = select_query
    .limit(per_page as i64)
    .offset(offset as i64);
  let items = select_many(pool, &query.to_string(), params, mapper)?;
  Ok(Some(Page {
    items,
    number,
    per_page,
    total,
    num_pages
  }))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn num_pages_rounds_up() {
    assert_eq!(num_pages(10, 8), 2);
    assert_eq!(num_pages(16, 8), 2);
    assert_eq!(num_pages(17, 8), 3);
  }

  #[test]
  fn empty_table_has_one_page() {
    assert_eq!(num_pages(0, 8), 1);
  }

  #[test]
  fn migrate_is_idempotent() {
    let pool = memory_pool();
    migrate(&pool).unwrap();
    assert_eq!(table_row_count(&pool, Table::Users).unwrap(), 0);
  }

  #[test]
  fn page_flags() {
    let page = Page { items: vec![1, 2], number: 2, per_page: 2, total: 6, num_pages: 3 };
    assert!(page.has_previous());
    assert!(page.has_next());
    let mapped = page.map(|i| i * 10);
    assert_eq!(mapped.items, vec![10, 20]);
  }
}
