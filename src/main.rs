mod accounts;
mod app;
mod config;
mod db;
mod error;
mod news;
mod utils;
use std::env;
use dotenv::dotenv;
use color_eyre::Result;

#[actix_web::main]
async fn main() -> Result<()> {
  // .env values end up in the environment, which is
  // where the config crate reads them from.
  dotenv().ok();
  if env::var("RUST_LOG").is_err() {
    env::set_var("RUST_LOG", "info");
  }
  env_logger::init();

  app::run().await
}
