use actix_web::{
  HttpRequest,
  HttpResponse,
  HttpMessage
};
use handlebars::Handlebars;
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use log::error;
use super::error::Error;

pub const SESSION_COOKIE: &'static str = "sessionid";

// Actix may or may not give us a port with the "IP address",
// and IPv6 ones come with brackets when there's a port.
pub fn real_ip_addr(req: &HttpRequest) -> Option<IpAddr> {
  req.connection_info().realip_remote_addr()
    .and_then(parse_ip)
    // Junk in the forwarding headers shouldn't lose the view.
    .or_else(|| req.peer_addr().map(|addr| addr.ip()))
}

fn parse_ip(value: &str) -> Option<IpAddr> {
  let value = value.trim();
  SocketAddr::from_str(value)
    .map(|s| s.ip())
    .or_else(|_| IpAddr::from_str(value.trim_start_matches('[').trim_end_matches(']')))
    .ok()
}

pub fn session_token(req: &HttpRequest) -> Option<String> {
  req.cookie(SESSION_COOKIE)
    .map(|c| c.value().to_string())
    .filter(|v| !v.is_empty())
}

pub fn render<T: Serialize>(
  hb: &Handlebars,
  template: &str,
  data: &T
) -> Result<HttpResponse, Error> {
  let body = hb.render(template, data)
    .map_err(|e| {
      error!("Template engine error when rendering {}: {}", template, e);
      Error::InternalServerError("Template engine error".to_string())
    })?;
  Ok(
    HttpResponse::Ok()
      .content_type("text/html; charset=utf-8")
      .body(body)
  )
}

// Query strings only give us usize values, page 0 doesn't
// exist so it's treated like any other out of range page.
pub fn page_number(page: Option<usize>) -> usize {
  page.unwrap_or(1)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ip_with_or_without_port() {
    assert_eq!(parse_ip("10.0.0.1"), Some("10.0.0.1".parse().unwrap()));
    assert_eq!(parse_ip("10.0.0.1:5555"), Some("10.0.0.1".parse().unwrap()));
    assert_eq!(parse_ip("[::1]:8080"), Some("::1".parse().unwrap()));
    assert_eq!(parse_ip("::1"), Some("::1".parse().unwrap()));
    assert_eq!(parse_ip("unknown"), None);
  }
}
