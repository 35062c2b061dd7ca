use rusqlite::{params, ToSql};
use color_eyre::Result;
use super::entities::ViewCount;
use super::mappers::{map_view_count, VIEW_COUNT_FIELDS};
use super::{
  Pool,
  Page,
  Query,
  Order,
  OrderBy,
  select_count,
  insert,
  paginate
};

// Append-only table: there's an insert, a count and a
// listing, nothing else.

pub fn insert_view_count(pool: &Pool, view: &ViewCount) -> Result<i64> {
  insert(
    pool,
    "INSERT INTO view_counts (news_id, ip_address, viewed_on) VALUES (?, ?, ?)",
    params![view.news_id, view.ip_address, view.viewed_on]
  )
}

pub fn view_count_for_news(pool: &Pool, news_id: i64) -> Result<i64> {
  select_count(
    pool,
    "SELECT count(*) FROM view_counts WHERE news_id = ?",
    params![news_id]
  )
}

pub fn view_counts_page(
  pool: &Pool,
  news_id: Option<i64>,
  number: usize,
  per_page: usize
) -> Result<Option<Page<ViewCount>>> {
  let mut count_query = Query::count("view_counts");
  let mut select_query = Query::select(VIEW_COUNT_FIELDS, "view_counts")
    .order(OrderBy::new(Order::Desc, "view_counts.viewed_on"))
    .order(OrderBy::new(Order::Desc, "view_counts.id"));
  let mut query_params: Vec<&dyn ToSql> = Vec::new();
  if let Some(news_id) = &news_id {
    count_query = count_query.where_clause("view_counts.news_id = ?");
    select_query = select_query.where_clause("view_counts.news_id = ?");
    query_params.push(news_id);
  }
  paginate(pool, count_query, select_query, &query_params, number, per_page, map_view_count)
}
