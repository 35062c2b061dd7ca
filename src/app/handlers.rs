use actix_web::{
  cookie::Cookie,
  http::header,
  web,
  HttpResponse,
  HttpRequest,
  Result
};
use serde::Deserialize;
use std::path::Path;
use log::{debug, info, warn};
use handlebars::Handlebars;
use super::dtos::*;
use super::error::Error;
use super::AppState;
use super::helpers;

// Public pages. Everything here only ever shows
// non-archived articles.

const HOME_ARTICLES: usize = 4;
const ARTICLES_PER_PAGE: usize = 8;

/* --- Request query or form objects --- */
#[derive(Deserialize)]
pub struct PageQuery {
  pub page: Option<usize>
}

#[derive(Deserialize)]
pub struct LoginForm {
  pub login: String,
  pub password: String
}
/* --- End request query or form objects --- */

pub async fn home(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>
) -> Result<HttpResponse, Error> {
  let articles = app_state.news.latest(HOME_ARTICLES)?;
  helpers::render(&hb, "home", &HomePage {
    site: &app_state.site_info,
    articles: articles.into_iter().map(Into::into).collect()
  })
}

pub async fn news_list(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  query: web::Query<PageQuery>
) -> Result<HttpResponse, Error> {
  let number = helpers::page_number(query.page);
  match app_state.news.published_page(number, ARTICLES_PER_PAGE)? {
    Some(page) => helpers::render(
      &hb,
      "news_list",
      &NewsListPage::new(&app_state.site_info, page)
    ),
    None => Err(Error::NotFound(format!("Page {} does not exist", number)))
  }
}

// Path variables have to be in a tuple.
pub async fn news_detail(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  path: web::Path<(i64,)>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let news_id = path.into_inner().0;
  let article = app_state.news.get_published(news_id)?;
  // The view is recorded before the count is read so the
  // page includes the current visit.
  match helpers::real_ip_addr(&req) {
    Some(ip) => {
      app_state.views.record_view(article.id, ip)?;
    },
    None => warn!("No client IP address for a view of article {}", article.id)
  }
  let view_count = app_state.news.view_count(article.id)?;
  let pictures = app_state.pictures.for_article(article.id)?;
  helpers::render(&hb, "news_detail", &NewsDetailPage {
    site: &app_state.site_info,
    article: ArticleDetailDto::new(article, view_count, pictures)
  })
}

pub async fn picture_file(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>
) -> Result<HttpResponse, Error> {
  let file_name = path.into_inner().0;
  let file_path = app_state.pictures.stored_file(&file_name)
    .ok_or_else(|| Error::NotFound(String::from("Picture does not exist")))?;
  let content = tokio::fs::read(&file_path).await
    .map_err(|e| {
      warn!("Could not read picture {:?} - {}", file_path, e);
      Error::NotFound(String::from("Picture does not exist"))
    })?;
  Ok(
    HttpResponse::Ok()
      .content_type(image_content_type(&file_name))
      .body(content)
  )
}

fn image_content_type(file_name: &str) -> &'static str {
  let extension = Path::new(file_name)
    .extension()
    .and_then(|e| e.to_str())
    .map(|e| e.to_lowercase());
  match extension.as_deref() {
    Some("png") => "image/png",
    Some("jpg") | Some("jpeg") => "image/jpeg",
    _ => "application/octet-stream"
  }
}

pub async fn login_form(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>
) -> Result<HttpResponse, Error> {
  helpers::render(&hb, "login", &LoginPage {
    site: &app_state.site_info,
    error: None
  })
}

pub async fn login(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  form: web::Form<LoginForm>
) -> Result<HttpResponse, Error> {
  if app_state.check_rate_limit() {
    return Err(Error::TooManyRequests);
  }
  match app_state.accounts.authenticate(&form.login, &form.password)? {
    Some(user) => {
      let session = app_state.sessions.open(&user)?;
      let cookie = Cookie::build(helpers::SESSION_COOKIE, session.token)
        .path("/")
        .http_only(true)
        .finish();
      Ok(
        HttpResponse::SeeOther()
          .header(header::LOCATION, "/")
          .cookie(cookie)
          .finish()
      )
    },
    None => {
      info!("Failed login attempt for {}", form.login);
      let mut response = helpers::render(&hb, "login", &LoginPage {
        site: &app_state.site_info,
        error: Some(String::from("Неверный логин или пароль"))
      })?;
      *response.status_mut() = actix_web::http::StatusCode::UNAUTHORIZED;
      Ok(response)
    }
  }
}

pub async fn logout(
  app_state: web::Data<AppState>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let mut response = HttpResponse::SeeOther();
  response.header(header::LOCATION, "/");
  if let Some(token) = helpers::session_token(&req) {
    if app_state.sessions.close(&token)? {
      debug!("Closed a session");
    }
    response.del_cookie(&Cookie::build(helpers::SESSION_COOKIE, "").path("/").finish());
  }
  Ok(response.finish())
}

// Default response when no route matched the request:
pub async fn not_found() -> Result<HttpResponse, Error> {
  Err(Error::NotFound(String::from("Page doesn't exist")))
}
