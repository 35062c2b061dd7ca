use actix_web::{middleware, web, App, HttpServer};
use color_eyre::Result;
use eyre::{WrapErr, eyre};
use log::{debug, error, info};
use handlebars::Handlebars;
use rate_limiter::BasicRateLimiter;
use std::sync::RwLock;
// Needs the crate prefix because of the "config"
// dependency.
use crate::config::{Config, SiteInfo};
use crate::db::{self, Pool};
use crate::accounts::UserAccountManager;
use crate::accounts::roles::RoleRegistry;
use crate::accounts::sessions::SessionStore;
use crate::news::NewsStore;
use crate::news::pictures::PictureStore;
use crate::news::views::ViewCountLedger;
mod admin;
mod auth;
mod dtos;
mod error;
mod handlers;
mod helpers;
mod rate_limiter;
#[cfg(test)]
mod tests;

pub struct AppState {
  pub roles: RoleRegistry,
  pub accounts: UserAccountManager,
  pub news: NewsStore,
  pub pictures: PictureStore,
  pub views: ViewCountLedger,
  pub sessions: SessionStore,
  pub rate_limiter: RwLock<BasicRateLimiter>,
  pub site_info: SiteInfo
}

impl AppState {

  pub fn new(pool: Pool, config: &Config) -> Self {
    let roles = RoleRegistry::new(pool.clone());
    Self {
      accounts: UserAccountManager::new(pool.clone(), roles.clone()),
      roles,
      news: NewsStore::new(pool.clone()),
      pictures: PictureStore::new(pool.clone(), &config.media_root),
      views: ViewCountLedger::new(pool.clone()),
      sessions: SessionStore::new(pool, config.session_ttl),
      rate_limiter: RwLock::new(
        BasicRateLimiter::new(
          config.rl_max_requests,
          config.rl_max_requests_time,
          config.rl_block_duration
        )
      ),
      site_info: SiteInfo::from(config)
    }
  }

  // True when the request should be refused.
  pub fn check_rate_limit(&self) -> bool {
    match self.rate_limiter.write() {
      Ok(mut rl) => rl.update(),
      Err(e) => {
        // A poisoned lock shouldn't lock everyone out
        // of the login page.
        error!("Could not get a write handle on the \
          rate limiter, SHOULD NEVER HAPPEN - {}", e);
        false
      }
    }
  }

}

pub fn templates(template_dir: &str) -> Result<Handlebars<'static>> {
  let mut handlebars = Handlebars::new();
  handlebars
    .register_templates_directory(".html", template_dir)
    .map_err(|e| eyre!("Loading templates from {} - {}", template_dir, e))?;
  Ok(handlebars)
}

// Has to be async, main.rs awaits it inside the
// #[actix_web::main] runtime.
pub async fn run() -> Result<()> {
  let config = Config::from_env()?;
  debug!("Current config: {:?}", config);
  let pool = db::open_pool(&config.db_path)?;
  db::migrate(&pool)?;

  let handlebars_ref = web::Data::new(templates(&config.template_dir)?);
  let app_state = web::Data::new(AppState::new(pool, &config));
  let max_upload_size = config.max_upload_size;
  info!("Starting server on {}", config.bind_address);

  HttpServer::new(move|| {
    App::new()
      .app_data(app_state.clone())
      .app_data(handlebars_ref.clone())
      .app_data(web::PayloadConfig::new(max_upload_size))
      .app_data(web::PathConfig::default().error_handler(|_, _| {
        actix_web::error::ErrorBadRequest("Invalid path arguments")
      }))
      .app_data(web::QueryConfig::default().error_handler(|_, _| {
        actix_web::error::ErrorBadRequest("Invalid query string arguments")
      }))
      .wrap(middleware::Logger::default())
      .configure(routes)
      .default_service(web::route().to(handlers::not_found))
  })
  .bind(&config.bind_address)?
  .run()
  .await
  .wrap_err("Start Actix web server")
}

pub fn routes(cfg: &mut web::ServiceConfig) {
  cfg.route("/", web::get().to(handlers::home))
    .route("/news/", web::get().to(handlers::news_list))
    .route("/news/{id}/", web::get().to(handlers::news_detail))
    .route("/static/img/{file_name}", web::get().to(handlers::picture_file))
    .route("/login/", web::get().to(handlers::login_form))
    .route("/login/", web::post().to(handlers::login))
    .route("/logout/", web::get().to(handlers::logout))
    .service(web::scope("/admin").configure(admin::routes));
}
