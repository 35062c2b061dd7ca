use rusqlite::{params, ToSql};
use color_eyre::Result;
use super::entities::NewsArticle;
use super::mappers::{map_news, NEWS_FIELDS, NEWS_FROM};
use super::helpers::{generate_field_like_qmark, like_pattern, bool_to_i32};
use super::{
  Pool,
  Page,
  Query,
  Order,
  OrderBy,
  select_one,
  select_many,
  select_count,
  execute,
  insert,
  paginate
};

// Newest first everywhere. Articles saved within the same
// second fall back to insertion order.
fn newest_first(query: Query) -> Query {
  query
    .order(OrderBy::new(Order::Desc, "news.date_of_create"))
    .order(OrderBy::new(Order::Desc, "news.id"))
}

pub fn news_by_id(pool: &Pool, news_id: i64) -> Result<Option<NewsArticle>> {
  select_one(
    pool,
    &format!("SELECT {} FROM {} WHERE news.id = ?", NEWS_FIELDS, NEWS_FROM),
    params![news_id],
    map_news
  )
}

pub fn latest_news(pool: &Pool, max: usize) -> Result<Vec<NewsArticle>> {
  let query = newest_first(
    Query::select(NEWS_FIELDS, NEWS_FROM)
      .where_clause("news.is_archived = 0")
  ).limit(max as i64);
  select_many(pool, &query.to_string(), params![], map_news)
}

pub fn published_news_page(
  pool: &Pool,
  number: usize,
  per_page: usize
) -> Result<Option<Page<NewsArticle>>> {
  paginate(
    pool,
    Query::count("news").where_clause("news.is_archived = 0"),
    newest_first(
      Query::select(NEWS_FIELDS, NEWS_FROM)
        .where_clause("news.is_archived = 0")
    ),
    &[],
    number,
    per_page,
    map_news
  )
}

// Admin listing, archived articles included.
pub fn news_page(
  pool: &Pool,
  search: Option<&str>,
  author_id: Option<i64>,
  number: usize,
  per_page: usize
) -> Result<Option<Page<NewsArticle>>> {
  let mut count_query = Query::count("news");
  let mut select_query = newest_first(Query::select(NEWS_FIELDS, NEWS_FROM));
  let pattern = search.map(like_pattern);
  let mut query_params: Vec<&dyn ToSql> = Vec::new();
  if let Some(p) = &pattern {
    let clause = generate_field_like_qmark("news.title");
    count_query = count_query.where_clause(&clause);
    select_query = select_query.where_clause(&clause);
    query_params.push(p);
  }
  if let Some(author_id) = &author_id {
    count_query = count_query.where_clause("news.author_id = ?");
    select_query = select_query.where_clause("news.author_id = ?");
    query_params.push(author_id);
  }
  paginate(pool, count_query, select_query, &query_params, number, per_page, map_news)
}

// The creation date only ever goes through here.
pub fn insert_news(pool: &Pool, article: &NewsArticle) -> Result<i64> {
  insert(
    pool,
    "INSERT INTO news (title, description, author_id, date_of_create, is_archived) \
      VALUES (?, ?, ?, ?, ?)",
    params![
      article.title,
      article.description,
      article.author_id,
      article.date_of_create,
      bool_to_i32(article.is_archived)
    ]
  )
}

// Note that date_of_create is not part of the update.
pub fn update_news(pool: &Pool, article: &NewsArticle) -> Result<usize> {
  execute(
    pool,
    "UPDATE news SET title = ?, description = ?, author_id = ?, is_archived = ? \
      WHERE id = ?",
    params![
      article.title,
      article.description,
      article.author_id,
      bool_to_i32(article.is_archived),
      article.id
    ]
  )
}

pub fn set_news_archived(
  pool: &Pool,
  news_id: i64,
  is_archived: bool
) -> Result<usize> {
  execute(
    pool,
    "UPDATE news SET is_archived = ? WHERE id = ?",
    params![bool_to_i32(is_archived), news_id]
  )
}

pub fn news_exists(pool: &Pool, news_id: i64) -> Result<bool> {
  let count = select_count(
    pool,
    "SELECT count(*) FROM news WHERE id = ?",
    params![news_id]
  )?;
  Ok(count > 0)
}
