use serde::{Deserialize, Serialize};
use crate::db::entities::*;
use crate::db::Page;
use crate::error::ValidationError;
use crate::utils::time_utils::{self, DateFormat};
use crate::utils::text_utils;
use crate::config::SiteInfo;

// Entities get converted to DTOs with From, nothing ever
// goes the other way. Passwords never make it into a DTO.

// Max length of the description preview on listing pages:
const EXCERPT_LENGTH: usize = 280;

#[derive(Debug, Serialize)]
pub struct JsonStatus {
  pub status: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
  pub message: String
}

impl From<&ValidationError> for JsonStatus {
  fn from(e: &ValidationError) -> Self {
    Self {
      status: String::from("error"),
      field: Some(e.field().to_string()),
      message: e.to_string()
    }
  }
}

#[derive(Debug, Serialize)]
pub struct RoleDto {
  pub id: i64,
  pub title: String,
  pub is_archived: bool
}

impl From<Role> for RoleDto {
  fn from(role: Role) -> Self {
    Self {
      id: role.id,
      title: role.title,
      is_archived: role.is_archived
    }
  }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
  pub id: i64,
  pub name: String,
  pub email: String,
  pub login: String,
  pub date_of_birth: String,
  pub role_id: Option<i64>,
  pub role: Option<String>,
  pub status: String,
  pub is_active: bool,
  pub is_archived: bool,
  pub is_staff: bool,
  pub is_superuser: bool,
  pub last_login: Option<String>
}

impl From<User> for UserDto {
  fn from(user: User) -> Self {
    Self {
      id: user.id,
      date_of_birth: user.date_of_birth.format("%Y-%m-%d").to_string(),
      role_id: user.role_id,
      role: user.role_title,
      status: user.status.to_string(),
      is_active: user.status.is_active(),
      is_archived: user.status.is_archived(),
      is_staff: user.is_staff,
      is_superuser: user.is_superuser,
      last_login: user.last_login
        .map(|ts| time_utils::timestamp_to_date_string(ts, DateFormat::Iso)),
      name: user.name,
      email: user.email,
      login: user.login
    }
  }
}

// Admin version of an article.
#[derive(Debug, Serialize)]
pub struct ArticleDto {
  pub id: i64,
  pub title: String,
  pub description: String,
  pub author_id: Option<i64>,
  pub author: Option<String>,
  pub date_of_create: String,
  pub is_archived: bool
}

impl From<NewsArticle> for ArticleDto {
  fn from(article: NewsArticle) -> Self {
    Self {
      id: article.id,
      title: article.title,
      description: article.description,
      author_id: article.author_id,
      author: article.author_name,
      date_of_create: time_utils::timestamp_to_date_string(
        article.date_of_create,
        DateFormat::Iso
      ),
      is_archived: article.is_archived
    }
  }
}

// What the home and listing pages show for each article.
#[derive(Debug, Serialize)]
pub struct ArticleSummaryDto {
  pub id: i64,
  pub title: String,
  pub excerpt: String,
  pub author: Option<String>,
  pub date: String
}

impl From<NewsArticle> for ArticleSummaryDto {
  fn from(article: NewsArticle) -> Self {
    Self {
      id: article.id,
      excerpt: text_utils::excerpt(&article.description, EXCERPT_LENGTH),
      title: article.title,
      author: article.author_name,
      date: time_utils::timestamp_to_date_string(
        article.date_of_create,
        DateFormat::Standard
      )
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ArticleDetailDto {
  pub id: i64,
  pub title: String,
  pub description: String,
  pub author: Option<String>,
  pub date: String,
  pub view_count: i64,
  pub pictures: Vec<PictureDto>
}

impl ArticleDetailDto {
  pub fn new(article: NewsArticle, view_count: i64, pictures: Vec<Picture>) -> Self {
    Self {
      id: article.id,
      title: article.title,
      description: article.description,
      author: article.author_name,
      date: time_utils::timestamp_to_date_string(
        article.date_of_create,
        DateFormat::Standard
      ),
      view_count,
      pictures: pictures.into_iter().map(Into::into).collect()
    }
  }
}

#[derive(Debug, Serialize)]
pub struct PictureDto {
  pub id: i64,
  pub path: String,
  pub url: String,
  pub news_id: Option<i64>,
  pub is_archived: bool
}

impl From<Picture> for PictureDto {
  fn from(picture: Picture) -> Self {
    Self {
      id: picture.id,
      url: format!("/{}", picture.path),
      path: picture.path,
      news_id: picture.news_id,
      is_archived: picture.is_archived
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ViewCountDto {
  pub id: i64,
  pub news_id: i64,
  pub ip_address: String,
  pub viewed_on: String
}

impl From<ViewCount> for ViewCountDto {
  fn from(view: ViewCount) -> Self {
    Self {
      id: view.id,
      news_id: view.news_id,
      ip_address: view.ip_address,
      viewed_on: time_utils::timestamp_to_date_string(view.viewed_on, DateFormat::Iso)
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct IdList {
  pub ids: Vec<i64>
}

#[derive(Debug, Serialize)]
pub struct ArchivedCount {
  pub archived: usize
}

/* --- Page models given to handlebars --- */

#[derive(Serialize)]
pub struct HomePage<'a> {
  pub site: &'a SiteInfo,
  pub articles: Vec<ArticleSummaryDto>
}

#[derive(Serialize)]
pub struct NewsListPage<'a> {
  pub site: &'a SiteInfo,
  pub page: Page<ArticleSummaryDto>,
  pub previous_page: Option<usize>,
  pub next_page: Option<usize>
}

impl<'a> NewsListPage<'a> {
  pub fn new(site: &'a SiteInfo, page: Page<NewsArticle>) -> Self {
    let previous_page = if page.has_previous() { Some(page.number - 1) } else { None };
    let next_page = if page.has_next() { Some(page.number + 1) } else { None };
    Self {
      site,
      page: page.map(Into::into),
      previous_page,
      next_page
    }
  }
}

#[derive(Serialize)]
pub struct NewsDetailPage<'a> {
  pub site: &'a SiteInfo,
  pub article: ArticleDetailDto
}

#[derive(Serialize)]
pub struct LoginPage<'a> {
  pub site: &'a SiteInfo,
  pub error: Option<String>
}
