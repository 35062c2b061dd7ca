use eyre::WrapErr;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::convert::From;

#[derive(Debug, Deserialize)]
pub struct Config {
  pub db_path: String,
  pub bind_address: String,
  pub template_dir: String,
  // Uploaded pictures go in <media_root>/static/img
  pub media_root: String,
  // Session lifetime in seconds:
  pub session_ttl: i64,
  // Max picture upload size in bytes:
  pub max_upload_size: usize,
  // Login rate limiter settings:
  pub rl_max_requests: u32,
  pub rl_max_requests_time: u32,
  pub rl_block_duration: u32,
  pub site_title: String
}

// The part of the config the templates get to see.
#[derive(Debug, Clone, Serialize)]
pub struct SiteInfo {
  pub title: String
}

impl From<&Config> for SiteInfo {
  fn from(config: &Config) -> Self {
    Self {
      title: config.site_title.clone()
    }
  }
}

impl Config {

  pub fn from_env() -> Result<Config> {
    let mut c = config::Config::new();
    // RUST_LOG is set in main.rs if absent.
    // Keys are lowercase compared to the .env file.
    c.set_default("db_path", "./news.sqlite")?;
    c.set_default("bind_address", "127.0.0.1:8080")?;
    c.set_default("template_dir", "./templates")?;
    c.set_default("media_root", ".")?;
    // Two weeks:
    c.set_default("session_ttl", 1_209_600i64)?;
    c.set_default("max_upload_size", 5_242_880i64)?;
    // Login attempts allowed in the window before
    // the endpoint gets blocked:
    c.set_default("rl_max_requests", 20i64)?;
    c.set_default("rl_max_requests_time", 60i64)?;
    c.set_default("rl_block_duration", 120i64)?;
    c.set_default("site_title", "Новости")?;

    c.merge(config::Environment::default())?;
    c.try_into()
      .wrap_err("Loading configuration from env")
  }

}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_enough() {
    let config = Config::from_env().unwrap();
    assert!(config.session_ttl > 0);
    assert!(config.max_upload_size > 0);
    assert!(!config.template_dir.is_empty());
  }

  #[test]
  fn site_info_copies_title() {
    let config = Config::from_env().unwrap();
    let info = SiteInfo::from(&config);
    assert_eq!(info.title, config.site_title);
  }
}
