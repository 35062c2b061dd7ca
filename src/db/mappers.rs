use super::entities::*;
use chrono::NaiveDate;
use rusqlite::{Row, Error};
use rusqlite::types::Type;

// Column lists live next to the mappers so the indexes
// below can't drift away from the SELECT clauses.

pub const ROLE_FIELDS: &'static str = "roles.id, roles.title, roles.is_archived";

pub const USER_FIELDS: &'static str = "users.id, users.name, users.email, \
  users.login, users.date_of_birth, users.role_id, roles.title, \
  users.password, users.is_archived, users.is_staff, users.is_superuser, \
  users.last_login";
pub const USER_FROM: &'static str = "users LEFT JOIN roles ON users.role_id = roles.id";

pub const NEWS_FIELDS: &'static str = "news.id, news.title, news.description, \
  news.author_id, users.name, news.date_of_create, news.is_archived";
pub const NEWS_FROM: &'static str = "news LEFT JOIN users ON news.author_id = users.id";

pub const PICTURE_FIELDS: &'static str = "pictures.id, pictures.path, \
  pictures.news_id, pictures.is_archived";

pub const VIEW_COUNT_FIELDS: &'static str = "view_counts.id, view_counts.news_id, \
  view_counts.ip_address, view_counts.viewed_on";

pub const DATE_OF_BIRTH_FORMAT: &'static str = "%Y-%m-%d";

pub fn map_role(row: &Row) -> Result<Role, Error> {
  Ok(Role {
    id: row.get(0)?,
    title: row.get(1)?,
    is_archived: row.get(2)?
  })
}

pub fn map_user(row: &Row) -> Result<User, Error> {
  let date_of_birth: String = row.get(4)?;
  let is_archived: bool = row.get(8)?;
  Ok(User {
    id: row.get(0)?,
    name: row.get(1)?,
    email: row.get(2)?,
    login: row.get(3)?,
    date_of_birth: NaiveDate::parse_from_str(&date_of_birth, DATE_OF_BIRTH_FORMAT)
      .map_err(|e| Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
    role_id: row.get(5)?,
    role_title: row.get(6)?,
    password: row.get(7)?,
    status: AccountStatus::from_archived_flag(is_archived),
    is_staff: row.get(9)?,
    is_superuser: row.get(10)?,
    last_login: row.get(11)?
  })
}

pub fn map_news(row: &Row) -> Result<NewsArticle, Error> {
  Ok(NewsArticle {
    id: row.get(0)?,
    title: row.get(1)?,
    description: row.get(2)?,
    author_id: row.get(3)?,
    author_name: row.get(4)?,
    date_of_create: row.get(5)?,
    is_archived: row.get(6)?
  })
}

pub fn map_picture(row: &Row) -> Result<Picture, Error> {
  Ok(Picture {
    id: row.get(0)?,
    path: row.get(1)?,
    news_id: row.get(2)?,
    is_archived: row.get(3)?
  })
}

pub fn map_view_count(row: &Row) -> Result<ViewCount, Error> {
  Ok(ViewCount {
    id: row.get(0)?,
    news_id: row.get(1)?,
    ip_address: row.get(2)?,
    viewed_on: row.get(3)?
  })
}

pub fn map_session(row: &Row) -> Result<Session, Error> {
  Ok(Session {
    token: row.get(0)?,
    user_id: row.get(1)?,
    expires_at: row.get(2)?
  })
}
