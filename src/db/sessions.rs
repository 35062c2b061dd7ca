use rusqlite::params;
use color_eyre::Result;
use super::entities::Session;
use super::mappers::map_session;
use super::{Pool, select_one, execute};

pub fn insert_session(pool: &Pool, session: &Session) -> Result<usize> {
  execute(
    pool,
    "INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)",
    params![session.token, session.user_id, session.expires_at]
  )
}

// Expired sessions are treated as missing.
pub fn live_session(
  pool: &Pool,
  token: &str,
  now: i64
) -> Result<Option<Session>> {
  select_one(
    pool,
    "SELECT token, user_id, expires_at FROM sessions \
      WHERE token = ? AND expires_at > ?",
    params![token, now],
    map_session
  )
}

pub fn delete_session(pool: &Pool, token: &str) -> Result<usize> {
  execute(
    pool,
    "DELETE FROM sessions WHERE token = ?",
    params![token]
  )
}

pub fn delete_expired_sessions(pool: &Pool, now: i64) -> Result<usize> {
  execute(
    pool,
    "DELETE FROM sessions WHERE expires_at <= ?",
    params![now]
  )
}
