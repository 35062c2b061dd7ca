use actix_web::{test, web, App};
use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use chrono::NaiveDate;
use handlebars::Handlebars;
use serde_json::{json, Value};
use tempfile::TempDir;
use crate::accounts::{NewUser, UserChanges};
use crate::config::Config;
use crate::db::{memory_pool, table_row_count, Pool, Table};
use crate::db::entities::User;
use super::*;

struct TestSite {
  state: web::Data<AppState>,
  hb: web::Data<Handlebars<'static>>,
  pool: Pool,
  _media: TempDir
}

fn test_config(media_root: &str, rl_max_requests: u32) -> Config {
  Config {
    db_path: String::from(":memory:"),
    bind_address: String::from("127.0.0.1:0"),
    template_dir: String::from(concat!(env!("CARGO_MANIFEST_DIR"), "/templates")),
    media_root: media_root.to_string(),
    session_ttl: 3600,
    max_upload_size: 1024 * 1024,
    rl_max_requests,
    rl_max_requests_time: 60,
    rl_block_duration: 60,
    site_title: String::from("Новости")
  }
}

fn site_with_limit(rl_max_requests: u32) -> TestSite {
  let media = TempDir::new().unwrap();
  let pool = memory_pool();
  let config = test_config(media.path().to_str().unwrap(), rl_max_requests);
  TestSite {
    state: web::Data::new(AppState::new(pool.clone(), &config)),
    hb: web::Data::new(templates(&config.template_dir).unwrap()),
    pool,
    _media: media
  }
}

fn site() -> TestSite {
  site_with_limit(100)
}

macro_rules! init_app {
  ($site:expr) => {
    test::init_service(
      App::new()
        .app_data($site.state.clone())
        .app_data($site.hb.clone())
        .configure(routes)
        .default_service(web::route().to(handlers::not_found))
    ).await
  };
}

fn staff(site: &TestSite) -> User {
  site.state.accounts.create_superuser(NewUser {
    email: Some(String::from("admin@example.ru")),
    password: Some(String::from("секрет")),
    name: Some(String::from("Админ")),
    date_of_birth: Some(NaiveDate::from_ymd(1985, 6, 1)),
    login: Some(String::from("admin")),
    role_id: None
  }).unwrap()
}

fn session_cookie(site: &TestSite, user: &User) -> Cookie<'static> {
  let session = site.state.sessions.open(user).unwrap();
  Cookie::new(helpers::SESSION_COOKIE, session.token)
}

fn publish(site: &TestSite, count: usize) -> Vec<i64> {
  (0..count)
    .map(|i| site.state.news.publish(&format!("News {}", i), "Текст новости", None).unwrap().id)
    .collect()
}

fn body_text(bytes: &[u8]) -> String {
  String::from_utf8(bytes.to_vec()).unwrap()
}

#[actix_rt::test]
async fn home_shows_the_four_latest_articles() {
  let site = site();
  publish(&site, 6);
  let mut app = init_app!(site);
  let resp = test::call_service(&mut app, test::TestRequest::get().uri("/").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_text(&test::read_body(resp).await);
  assert_eq!(body.matches("class=\"news-item\"").count(), 4);
  let newest = body.find("News 5").unwrap();
  let oldest_shown = body.find("News 2").unwrap();
  assert!(newest < oldest_shown);
  assert!(!body.contains("News 1"));
}

#[actix_rt::test]
async fn listing_skips_archived_and_paginates() {
  let site = site();
  let ids = publish(&site, 12);
  site.state.news.archive(ids[0]).unwrap();
  site.state.news.archive(ids[1]).unwrap();
  let mut app = init_app!(site);

  let resp = test::call_service(&mut app, test::TestRequest::get().uri("/news/").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_text(&test::read_body(resp).await);
  assert_eq!(body.matches("class=\"news-item\"").count(), 8);
  assert!(body.contains("Страница 1 из 2"));

  let resp = test::call_service(&mut app, test::TestRequest::get().uri("/news/?page=2").to_request()).await;
  let body = body_text(&test::read_body(resp).await);
  assert_eq!(body.matches("class=\"news-item\"").count(), 2);
  assert!(!body.contains("News 0<"));

  let resp = test::call_service(&mut app, test::TestRequest::get().uri("/news/?page=3").to_request()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn empty_listing_is_not_a_404() {
  let site = site();
  let mut app = init_app!(site);
  let resp = test::call_service(&mut app, test::TestRequest::get().uri("/news/").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn detail_records_every_view() {
  let site = site();
  let id = publish(&site, 1)[0];
  let mut app = init_app!(site);
  let uri = format!("/news/{}/", id);
  for peer in &["10.0.0.1:4000", "10.0.0.1:4001"] {
    let req = test::TestRequest::get()
      .uri(&uri)
      .peer_addr(peer.parse().unwrap())
      .to_request();
    let resp = test::call_service(&mut app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }
  assert_eq!(site.state.news.view_count(id).unwrap(), 2);

  let req = test::TestRequest::get()
    .uri(&uri)
    .peer_addr("192.168.1.20:5000".parse().unwrap())
    .to_request();
  let body = body_text(&test::read_body(test::call_service(&mut app, req).await).await);
  assert!(body.contains("<span class=\"view-count\">3</span>"));
}

#[actix_rt::test]
async fn garbage_forwarded_for_falls_back_to_the_peer() {
  let site = site();
  let id = publish(&site, 1)[0];
  let mut app = init_app!(site);
  let req = test::TestRequest::get()
    .uri(&format!("/news/{}/", id))
    .peer_addr("10.0.0.1:4000".parse().unwrap())
    .header("X-Forwarded-For", "unknown")
    .to_request();
  assert_eq!(test::call_service(&mut app, req).await.status(), StatusCode::OK);
  assert_eq!(site.state.news.view_count(id).unwrap(), 1);
}

#[actix_rt::test]
async fn archived_and_unknown_articles_are_404() {
  let site = site();
  let id = publish(&site, 1)[0];
  site.state.news.archive(id).unwrap();
  let mut app = init_app!(site);
  for uri in &[format!("/news/{}/", id), String::from("/news/999/")] {
    let resp = test::call_service(&mut app, test::TestRequest::get().uri(uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
  assert_eq!(site.state.news.view_count(id).unwrap(), 0);
}

#[actix_rt::test]
async fn admin_requires_a_staff_session() {
  let site = site();
  let mut app = init_app!(site);
  let resp = test::call_service(&mut app, test::TestRequest::get().uri("/admin/roles").to_request()).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let client = site.state.accounts.create_user(NewUser {
    email: Some(String::from("client@example.ru")),
    password: Some(String::from("пароль")),
    name: Some(String::from("Клиент")),
    date_of_birth: Some(NaiveDate::from_ymd(1990, 1, 1)),
    login: Some(String::from("client")),
    role_id: None
  }).unwrap();
  let req = test::TestRequest::get()
    .uri("/admin/roles")
    .cookie(session_cookie(&site, &client))
    .to_request();
  assert_eq!(test::call_service(&mut app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn login_sets_a_session_cookie() {
  let site = site();
  staff(&site);
  let mut app = init_app!(site);
  let req = test::TestRequest::post()
    .uri("/login/")
    .set_form(&[("login", "admin"), ("password", "секрет")])
    .to_request();
  let resp = test::call_service(&mut app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  let cookie = resp.response().cookies()
    .find(|c| c.name() == helpers::SESSION_COOKIE)
    .unwrap()
    .into_owned();

  let req = test::TestRequest::get().uri("/admin/users").cookie(cookie.clone()).to_request();
  let page: Value = test::read_response_json(&mut app, req).await;
  assert_eq!(page["total"], 1);
  assert_eq!(page["items"][0]["login"], "admin");
  assert!(page["items"][0].get("password").is_none());

  let req = test::TestRequest::get().uri("/logout/").cookie(cookie.clone()).to_request();
  assert_eq!(test::call_service(&mut app, req).await.status(), StatusCode::SEE_OTHER);
  let req = test::TestRequest::get().uri("/admin/users").cookie(cookie).to_request();
  assert_eq!(test::call_service(&mut app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn wrong_password_is_refused() {
  let site = site();
  staff(&site);
  let mut app = init_app!(site);
  let req = test::TestRequest::post()
    .uri("/login/")
    .set_form(&[("login", "admin"), ("password", "nope")])
    .to_request();
  let resp = test::call_service(&mut app, req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.response().cookies().next().is_none());
}

#[actix_rt::test]
async fn login_is_rate_limited() {
  let site = site_with_limit(2);
  let mut app = init_app!(site);
  let mut statuses = Vec::new();
  for _ in 0..3 {
    let req = test::TestRequest::post()
      .uri("/login/")
      .set_form(&[("login", "ghost"), ("password", "x")])
      .to_request();
    statuses.push(test::call_service(&mut app, req).await.status());
  }
  assert_eq!(statuses, vec![
    StatusCode::UNAUTHORIZED,
    StatusCode::UNAUTHORIZED,
    StatusCode::TOO_MANY_REQUESTS
  ]);
}

#[actix_rt::test]
async fn validation_errors_name_the_field() {
  let site = site();
  let admin = staff(&site);
  let mut app = init_app!(site);
  let req = test::TestRequest::post()
    .uri("/admin/users")
    .cookie(session_cookie(&site, &admin))
    .set_json(&json!({
      "email": "john@example.com",
      "password": "secret",
      "name": "John",
      "date_of_birth": "1990-05-05",
      "login": "john"
    }))
    .to_request();
  let resp = test::call_service(&mut app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
  assert_eq!(body["status"], "error");
  assert_eq!(body["field"], "name");
}

// Staff rights without the superuser flag.
fn editor(site: &TestSite) -> User {
  let user = site.state.accounts.create_user(NewUser {
    email: Some(String::from("editor@example.ru")),
    password: Some(String::from("пароль")),
    name: Some(String::from("Редактор")),
    date_of_birth: Some(NaiveDate::from_ymd(1992, 4, 4)),
    login: Some(String::from("editor")),
    role_id: None
  }).unwrap();
  site.state.accounts.update(user.id, UserChanges {
    is_staff: Some(true),
    ..Default::default()
  }).unwrap()
}

#[actix_rt::test]
async fn only_superusers_grant_privileges() {
  let site = site();
  let admin = staff(&site);
  let editor = editor(&site);
  let mut app = init_app!(site);
  let cookie = session_cookie(&site, &editor);

  for (target, body) in &[
    (editor.id, json!({ "is_superuser": true })),
    (admin.id, json!({ "is_staff": false }))
  ] {
    let req = test::TestRequest::put()
      .uri(&format!("/admin/users/{}", target))
      .cookie(cookie.clone())
      .set_json(body)
      .to_request();
    assert_eq!(test::call_service(&mut app, req).await.status(), StatusCode::FORBIDDEN);
  }
  assert!(!site.state.accounts.get(editor.id).unwrap().is_superuser);
  assert!(site.state.accounts.get(admin.id).unwrap().is_staff);

  // Other fields are still fine for plain staff:
  let req = test::TestRequest::put()
    .uri(&format!("/admin/users/{}", editor.id))
    .cookie(cookie)
    .set_json(&json!({ "name": "Редактор Два" }))
    .to_request();
  assert_eq!(test::call_service(&mut app, req).await.status(), StatusCode::OK);

  let req = test::TestRequest::put()
    .uri(&format!("/admin/users/{}", editor.id))
    .cookie(session_cookie(&site, &admin))
    .set_json(&json!({ "is_superuser": true }))
    .to_request();
  let user: Value = test::read_response_json(&mut app, req).await;
  assert_eq!(user["is_superuser"], true);
}

#[actix_rt::test]
async fn created_users_get_the_default_role() {
  let site = site();
  let admin = staff(&site);
  let mut app = init_app!(site);
  let req = test::TestRequest::post()
    .uri("/admin/users")
    .cookie(session_cookie(&site, &admin))
    .set_json(&json!({
      "email": "ivan@example.ru",
      "password": "secret",
      "name": "Иван",
      "date_of_birth": "1990-05-05",
      "login": "ivan"
    }))
    .to_request();
  let resp = test::call_service(&mut app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let user: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
  assert_eq!(user["role"], "Client");
  assert_eq!(user["is_active"], true);
}

#[actix_rt::test]
async fn delete_archives_instead() {
  let site = site();
  let admin = staff(&site);
  let ids = publish(&site, 3);
  let mut app = init_app!(site);
  let cookie = session_cookie(&site, &admin);

  let req = test::TestRequest::delete()
    .uri(&format!("/admin/news/{}", ids[0]))
    .cookie(cookie.clone())
    .to_request();
  let article: Value = test::read_response_json(&mut app, req).await;
  assert_eq!(article["is_archived"], true);

  let req = test::TestRequest::post()
    .uri("/admin/news/archive")
    .cookie(cookie)
    .set_json(&json!({ "ids": [ids[1], ids[2]] }))
    .to_request();
  let result: Value = test::read_response_json(&mut app, req).await;
  assert_eq!(result["archived"], 2);

  assert_eq!(table_row_count(&site.pool, Table::News).unwrap(), 3);
  assert!(site.state.news.latest(4).unwrap().is_empty());
}

#[actix_rt::test]
async fn archived_user_cannot_log_in() {
  let site = site();
  let admin = staff(&site);
  let mut app = init_app!(site);
  let req = test::TestRequest::delete()
    .uri(&format!("/admin/users/{}", admin.id))
    .cookie(session_cookie(&site, &admin))
    .to_request();
  let user: Value = test::read_response_json(&mut app, req).await;
  assert_eq!(user["is_archived"], true);
  assert_eq!(user["is_active"], false);

  let req = test::TestRequest::post()
    .uri("/login/")
    .set_form(&[("login", "admin"), ("password", "секрет")])
    .to_request();
  assert_eq!(test::call_service(&mut app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn picture_upload_and_serving() {
  let site = site();
  let admin = staff(&site);
  let id = publish(&site, 1)[0];
  let mut app = init_app!(site);
  let cookie = session_cookie(&site, &admin);

  let req = test::TestRequest::post()
    .uri(&format!("/admin/pictures?news_id={}&file_name=cat.gif", id))
    .cookie(cookie.clone())
    .set_payload(b"GIF89a".to_vec())
    .to_request();
  let resp = test::call_service(&mut app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
  assert_eq!(body["field"], "path");

  let req = test::TestRequest::post()
    .uri(&format!("/admin/pictures?news_id={}&file_name=cat.png", id))
    .cookie(cookie)
    .set_payload(b"png bytes".to_vec())
    .to_request();
  let picture: Value = test::read_response_json(&mut app, req).await;
  assert_eq!(picture["url"], "/static/img/cat.png");

  let resp = test::call_service(
    &mut app,
    test::TestRequest::get().uri("/static/img/cat.png").to_request()
  ).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(&test::read_body(resp).await[..], b"png bytes");

  let req = test::TestRequest::get()
    .uri(&format!("/news/{}/", id))
    .peer_addr("10.0.0.1:4000".parse().unwrap())
    .to_request();
  let body = body_text(&test::read_body(test::call_service(&mut app, req).await).await);
  assert!(body.contains("src=\"/static/img/cat.png\""));
}

#[actix_rt::test]
async fn views_are_listed_for_admins() {
  let site = site();
  let admin = staff(&site);
  let id = publish(&site, 1)[0];
  site.state.views.record_view(id, "10.0.0.1".parse().unwrap()).unwrap();
  site.state.views.record_view(id, "10.0.0.2".parse().unwrap()).unwrap();
  let mut app = init_app!(site);
  let req = test::TestRequest::get()
    .uri(&format!("/admin/views?news_id={}", id))
    .cookie(session_cookie(&site, &admin))
    .to_request();
  let page: Value = test::read_response_json(&mut app, req).await;
  assert_eq!(page["total"], 2);
  assert_eq!(page["items"][0]["ip_address"], "10.0.0.2");
}

#[actix_rt::test]
async fn unknown_routes_are_404() {
  let site = site();
  let mut app = init_app!(site);
  let resp = test::call_service(&mut app, test::TestRequest::get().uri("/nope").to_request()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
