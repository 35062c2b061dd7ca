use rusqlite::{params, ToSql};
use color_eyre::Result;
use super::entities::Picture;
use super::mappers::{map_picture, PICTURE_FIELDS};
use super::helpers::{generate_field_like_qmark, like_pattern, bool_to_i32};
use super::{
  Pool,
  Page,
  Query,
  Order,
  OrderBy,
  select_one,
  select_many,
  execute,
  insert,
  paginate
};

pub fn picture_by_id(pool: &Pool, picture_id: i64) -> Result<Option<Picture>> {
  select_one(
    pool,
    &format!("SELECT {} FROM pictures WHERE pictures.id = ?", PICTURE_FIELDS),
    params![picture_id],
    map_picture
  )
}

pub fn pictures_for_news(pool: &Pool, news_id: i64) -> Result<Vec<Picture>> {
  select_many(
    pool,
    &format!(
      "SELECT {} FROM pictures WHERE pictures.news_id = ? \
        AND pictures.is_archived = 0 ORDER BY pictures.id ASC",
      PICTURE_FIELDS
    ),
    params![news_id],
    map_picture
  )
}

pub fn insert_picture(pool: &Pool, picture: &Picture) -> Result<i64> {
  insert(
    pool,
    "INSERT INTO pictures (path, news_id, is_archived) VALUES (?, ?, ?)",
    params![picture.path, picture.news_id, bool_to_i32(picture.is_archived)]
  )
}

// The path is never rewritten once the file is stored.
pub fn update_picture(pool: &Pool, picture: &Picture) -> Result<usize> {
  execute(
    pool,
    "UPDATE pictures SET news_id = ?, is_archived = ? WHERE id = ?",
    params![picture.news_id, bool_to_i32(picture.is_archived), picture.id]
  )
}

pub fn set_picture_archived(
  pool: &Pool,
  picture_id: i64,
  is_archived: bool
) -> Result<usize> {
  execute(
    pool,
    "UPDATE pictures SET is_archived = ? WHERE id = ?",
    params![bool_to_i32(is_archived), picture_id]
  )
}

// Search goes through the parent article title.
pub fn pictures_page(
  pool: &Pool,
  search: Option<&str>,
  news_id: Option<i64>,
  number: usize,
  per_page: usize
) -> Result<Option<Page<Picture>>> {
  let from = "pictures LEFT JOIN news ON pictures.news_id = news.id";
  let mut count_query = Query::count(from);
  let mut select_query = Query::select(PICTURE_FIELDS, from)
    .order(OrderBy::new(Order::Desc, "pictures.id"));
  let pattern = search.map(like_pattern);
  let mut query_params: Vec<&dyn ToSql> = Vec::new();
  if let Some(p) = &pattern {
    let clause = generate_field_like_qmark("news.title");
    count_query = count_query.where_clause(&clause);
    select_query = select_query.where_clause(&clause);
    query_params.push(p);
  }
  if let Some(news_id) = &news_id {
    count_query = count_query.where_clause("pictures.news_id = ?");
    select_query = select_query.where_clause("pictures.news_id = ?");
    query_params.push(news_id);
  }
  paginate(pool, count_query, select_query, &query_params, number, per_page, map_picture)
}
