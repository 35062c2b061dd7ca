use actix_web::{web, HttpResponse, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use log::info;
use crate::accounts::{NewUser, UserChanges};
use crate::accounts::validation::parse_date_of_birth;
use crate::db::Page;
use crate::error::{StoreResult, ValidationError};
use crate::news::ArticleChanges;
use crate::news::pictures::PictureChanges;
use crate::utils::serde_utils::{self, empty_string_to_none};
use super::auth::StaffUser;
use super::dtos::*;
use super::error::Error;
use super::AppState;

// JSON admin surface. Every handler takes a StaffUser so
// nothing in here runs without a staff session. Deleting
// anything means archiving it.

const ADMIN_PER_PAGE: usize = 10;

/* --- Request body or query objects --- */
#[derive(Deserialize)]
pub struct RoleListQuery {
  pub search: Option<String>,
  pub page: Option<usize>
}

#[derive(Deserialize)]
pub struct UserListQuery {
  pub search: Option<String>,
  pub role_id: Option<i64>,
  pub page: Option<usize>
}

#[derive(Deserialize)]
pub struct NewsListQuery {
  pub search: Option<String>,
  pub author_id: Option<i64>,
  pub page: Option<usize>
}

#[derive(Deserialize)]
pub struct PictureListQuery {
  pub search: Option<String>,
  pub news_id: Option<i64>,
  pub page: Option<usize>
}

#[derive(Deserialize)]
pub struct ViewListQuery {
  pub news_id: Option<i64>,
  pub page: Option<usize>
}

#[derive(Deserialize)]
pub struct UploadQuery {
  pub news_id: Option<i64>,
  pub file_name: String
}

#[derive(Deserialize)]
pub struct RoleBody {
  pub title: Option<String>,
  pub is_archived: Option<bool>
}

#[derive(Deserialize)]
pub struct NewUserBody {
  pub email: Option<String>,
  pub password: Option<String>,
  pub name: Option<String>,
  pub date_of_birth: Option<String>,
  pub login: Option<String>,
  pub role_id: Option<i64>,
  #[serde(default)]
  pub is_superuser: bool
}

#[derive(Deserialize)]
pub struct UserChangesBody {
  pub name: Option<String>,
  pub email: Option<String>,
  pub login: Option<String>,
  pub date_of_birth: Option<String>,
  // null clears the role, absent leaves it alone.
  #[serde(
    default,
    deserialize_with = "serde_utils::deserialize_null_value"
  )]
  pub role_id: Option<Option<i64>>,
  pub password: Option<String>,
  pub is_staff: Option<bool>,
  pub is_superuser: Option<bool>,
  pub is_active: Option<bool>,
  pub is_archived: Option<bool>
}

#[derive(Deserialize)]
pub struct NewArticleBody {
  pub title: Option<String>,
  pub description: Option<String>
}

#[derive(Deserialize)]
pub struct ArticleChangesBody {
  pub title: Option<String>,
  pub description: Option<String>,
  #[serde(
    default,
    deserialize_with = "serde_utils::deserialize_null_value"
  )]
  pub author_id: Option<Option<i64>>,
  pub is_archived: Option<bool>
}

#[derive(Deserialize)]
pub struct PictureChangesBody {
  #[serde(
    default,
    deserialize_with = "serde_utils::deserialize_null_value"
  )]
  pub news_id: Option<Option<i64>>,
  pub is_archived: Option<bool>
}
/* --- End request body or query objects --- */

fn optional_date(value: Option<String>) -> Result<Option<NaiveDate>, ValidationError> {
  match empty_string_to_none(value) {
    Some(date) => parse_date_of_birth(&date).map(Some),
    None => Ok(None)
  }
}

// Out of range pages are a 404, same as the public listing.
fn page_response<T, D>(page: Option<Page<T>>) -> Result<HttpResponse, Error>
  where D: Serialize + From<T>
{
  match page {
    Some(page) => Ok(HttpResponse::Ok().json(page.map(D::from))),
    None => Err(Error::NotFound(String::from("Page does not exist")))
  }
}

// Bulk archive goes through the same single-item archive
// as DELETE. Stops at the first failure.
fn archive_all<T, F>(ids: &[i64], archive: F) -> Result<HttpResponse, Error>
  where F: Fn(i64) -> StoreResult<T>
{
  for id in ids {
    archive(*id)?;
  }
  info!("Bulk archived {} items", ids.len());
  Ok(HttpResponse::Ok().json(ArchivedCount { archived: ids.len() }))
}

/* --- Roles --- */

pub async fn list_roles(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  query: web::Query<RoleListQuery>
) -> Result<HttpResponse, Error> {
  let query = query.into_inner();
  let search = empty_string_to_none(query.search);
  let page = app_state.roles.list(
    search.as_deref(),
    query.page.unwrap_or(1),
    ADMIN_PER_PAGE
  )?;
  page_response::<_, RoleDto>(page)
}

pub async fn get_role(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let role = app_state.roles.get(path.into_inner().0)?;
  Ok(HttpResponse::Ok().json(RoleDto::from(role)))
}

pub async fn create_role(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  body: web::Json<RoleBody>
) -> Result<HttpResponse, Error> {
  let title = empty_string_to_none(body.into_inner().title)
    .ok_or(ValidationError::MissingField("title"))?;
  let role = app_state.roles.create(&title)?;
  Ok(HttpResponse::Created().json(RoleDto::from(role)))
}

pub async fn update_role(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  path: web::Path<(i64,)>,
  body: web::Json<RoleBody>
) -> Result<HttpResponse, Error> {
  let role_id = path.into_inner().0;
  let body = body.into_inner();
  let mut role = app_state.roles.get(role_id)?;
  if let Some(title) = body.title {
    role = app_state.roles.rename(role_id, &title)?;
  }
  match body.is_archived {
    Some(true) => role = app_state.roles.archive(role_id)?,
    Some(false) => role = app_state.roles.unarchive(role_id)?,
    None => ()
  }
  Ok(HttpResponse::Ok().json(RoleDto::from(role)))
}

pub async fn delete_role(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let role = app_state.roles.archive(path.into_inner().0)?;
  Ok(HttpResponse::Ok().json(RoleDto::from(role)))
}

pub async fn archive_roles(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  body: web::Json<IdList>
) -> Result<HttpResponse, Error> {
  archive_all(&body.ids, |id| app_state.roles.archive(id))
}

/* --- Users --- */

pub async fn list_users(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  query: web::Query<UserListQuery>
) -> Result<HttpResponse, Error> {
  let query = query.into_inner();
  let search = empty_string_to_none(query.search);
  let page = app_state.accounts.list(
    search.as_deref(),
    query.role_id,
    query.page.unwrap_or(1),
    ADMIN_PER_PAGE
  )?;
  page_response::<_, UserDto>(page)
}

pub async fn get_user(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let user = app_state.accounts.get(path.into_inner().0)?;
  Ok(HttpResponse::Ok().json(UserDto::from(user)))
}

pub async fn create_user(
  app_state: web::Data<AppState>,
  staff: StaffUser,
  body: web::Json<NewUserBody>
) -> Result<HttpResponse, Error> {
  let body = body.into_inner();
  // Only superusers get to make more superusers.
  if body.is_superuser && !staff.0.is_superuser {
    return Err(Error::Forbidden(String::from("Superusers only")));
  }
  let new_user = NewUser {
    email: body.email,
    password: body.password,
    name: body.name,
    date_of_birth: optional_date(body.date_of_birth)?,
    login: body.login,
    role_id: body.role_id
  };
  let user = if body.is_superuser {
    app_state.accounts.create_superuser(new_user)?
  } else {
    app_state.accounts.create_user(new_user)?
  };
  Ok(HttpResponse::Created().json(UserDto::from(user)))
}

pub async fn update_user(
  app_state: web::Data<AppState>,
  staff: StaffUser,
  path: web::Path<(i64,)>,
  body: web::Json<UserChangesBody>
) -> Result<HttpResponse, Error> {
  let body = body.into_inner();
  // Same rule as creation, and staff rights count too.
  if (body.is_superuser.is_some() || body.is_staff.is_some()) && !staff.0.is_superuser {
    return Err(Error::Forbidden(String::from("Superusers only")));
  }
  let changes = UserChanges {
    name: body.name,
    email: body.email,
    login: body.login,
    date_of_birth: optional_date(body.date_of_birth)?,
    role_id: body.role_id,
    password: body.password,
    is_staff: body.is_staff,
    is_superuser: body.is_superuser,
    is_active: body.is_active,
    is_archived: body.is_archived
  };
  let user = app_state.accounts.update(path.into_inner().0, changes)?;
  Ok(HttpResponse::Ok().json(UserDto::from(user)))
}

pub async fn delete_user(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let user = app_state.accounts.archive(path.into_inner().0)?;
  Ok(HttpResponse::Ok().json(UserDto::from(user)))
}

pub async fn archive_users(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  body: web::Json<IdList>
) -> Result<HttpResponse, Error> {
  archive_all(&body.ids, |id| app_state.accounts.archive(id))
}

/* --- News --- */

pub async fn list_news(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  query: web::Query<NewsListQuery>
) -> Result<HttpResponse, Error> {
  let query = query.into_inner();
  let search = empty_string_to_none(query.search);
  let page = app_state.news.list(
    search.as_deref(),
    query.author_id,
    query.page.unwrap_or(1),
    ADMIN_PER_PAGE
  )?;
  page_response::<_, ArticleDto>(page)
}

pub async fn get_news(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let article = app_state.news.get(path.into_inner().0)?;
  Ok(HttpResponse::Ok().json(ArticleDto::from(article)))
}

// The logged in staff member is the author.
pub async fn create_news(
  app_state: web::Data<AppState>,
  staff: StaffUser,
  body: web::Json<NewArticleBody>
) -> Result<HttpResponse, Error> {
  let body = body.into_inner();
  let article = app_state.news.publish(
    body.title.as_deref().unwrap_or(""),
    body.description.as_deref().unwrap_or(""),
    Some(&staff.0)
  )?;
  Ok(HttpResponse::Created().json(ArticleDto::from(article)))
}

pub async fn update_news(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  path: web::Path<(i64,)>,
  body: web::Json<ArticleChangesBody>
) -> Result<HttpResponse, Error> {
  let body = body.into_inner();
  let article = app_state.news.update(path.into_inner().0, ArticleChanges {
    title: body.title,
    description: body.description,
    author_id: body.author_id,
    is_archived: body.is_archived
  })?;
  Ok(HttpResponse::Ok().json(ArticleDto::from(article)))
}

pub async fn delete_news(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let article = app_state.news.archive(path.into_inner().0)?;
  Ok(HttpResponse::Ok().json(ArticleDto::from(article)))
}

pub async fn archive_news(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  body: web::Json<IdList>
) -> Result<HttpResponse, Error> {
  archive_all(&body.ids, |id| app_state.news.archive(id))
}

/* --- Pictures --- */

pub async fn list_pictures(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  query: web::Query<PictureListQuery>
) -> Result<HttpResponse, Error> {
  let query = query.into_inner();
  let search = empty_string_to_none(query.search);
  let page = app_state.pictures.list(
    search.as_deref(),
    query.news_id,
    query.page.unwrap_or(1),
    ADMIN_PER_PAGE
  )?;
  page_response::<_, PictureDto>(page)
}

pub async fn get_picture(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let picture = app_state.pictures.get(path.into_inner().0)?;
  Ok(HttpResponse::Ok().json(PictureDto::from(picture)))
}

// The request body is the file itself.
pub async fn upload_picture(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  query: web::Query<UploadQuery>,
  body: web::Bytes
) -> Result<HttpResponse, Error> {
  if body.is_empty() {
    return Err(ValidationError::ContentEmpty("path").into());
  }
  let picture = app_state.pictures.attach(&query.file_name, &body, query.news_id)?;
  Ok(HttpResponse::Created().json(PictureDto::from(picture)))
}

pub async fn update_picture(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  path: web::Path<(i64,)>,
  body: web::Json<PictureChangesBody>
) -> Result<HttpResponse, Error> {
  let body = body.into_inner();
  let picture = app_state.pictures.update(path.into_inner().0, PictureChanges {
    news_id: body.news_id,
    is_archived: body.is_archived
  })?;
  Ok(HttpResponse::Ok().json(PictureDto::from(picture)))
}

pub async fn delete_picture(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let picture = app_state.pictures.archive(path.into_inner().0)?;
  Ok(HttpResponse::Ok().json(PictureDto::from(picture)))
}

pub async fn archive_pictures(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  body: web::Json<IdList>
) -> Result<HttpResponse, Error> {
  archive_all(&body.ids, |id| app_state.pictures.archive(id))
}

/* --- Views, read-only --- */

pub async fn list_views(
  app_state: web::Data<AppState>,
  _staff: StaffUser,
  query: web::Query<ViewListQuery>
) -> Result<HttpResponse, Error> {
  let page = app_state.views.list(
    query.news_id,
    query.page.unwrap_or(1),
    ADMIN_PER_PAGE
  )?;
  page_response::<_, ViewCountDto>(page)
}

// Mounted under /admin. The bulk archive routes are declared
// before the {id} ones.
pub fn routes(cfg: &mut web::ServiceConfig) {
  cfg.route("/roles", web::get().to(list_roles))
    .route("/roles", web::post().to(create_role))
    .route("/roles/archive", web::post().to(archive_roles))
    .route("/roles/{id}", web::get().to(get_role))
    .route("/roles/{id}", web::put().to(update_role))
    .route("/roles/{id}", web::delete().to(delete_role))
    .route("/users", web::get().to(list_users))
    .route("/users", web::post().to(create_user))
    .route("/users/archive", web::post().to(archive_users))
    .route("/users/{id}", web::get().to(get_user))
    .route("/users/{id}", web::put().to(update_user))
    .route("/users/{id}", web::delete().to(delete_user))
    .route("/news", web::get().to(list_news))
    .route("/news", web::post().to(create_news))
    .route("/news/archive", web::post().to(archive_news))
    .route("/news/{id}", web::get().to(get_news))
    .route("/news/{id}", web::put().to(update_news))
    .route("/news/{id}", web::delete().to(delete_news))
    .route("/pictures", web::get().to(list_pictures))
    .route("/pictures", web::post().to(upload_picture))
    .route("/pictures/archive", web::post().to(archive_pictures))
    .route("/pictures/{id}", web::get().to(get_picture))
    .route("/pictures/{id}", web::put().to(update_picture))
    .route("/pictures/{id}", web::delete().to(delete_picture))
    .route("/views", web::get().to(list_views));
}
