use log::{debug, info};
use uuid::Uuid;
use crate::db::{self, Pool};
use crate::db::entities::{Session, User};
use crate::error::{StoreResult, OrDbError};
use crate::utils::time_utils::current_timestamp;

// Cookie-backed login sessions. The token is the only thing
// the browser gets, the rest stays in the sessions table.
#[derive(Clone)]
pub struct SessionStore {
  pool: Pool,
  ttl: i64
}

impl SessionStore {

  pub fn new(pool: Pool, ttl: i64) -> Self {
    Self { pool, ttl }
  }

  pub fn open(&self, user: &User) -> StoreResult<Session> {
    let now = current_timestamp();
    // Good time to get rid of the old ones.
    let expired = db::delete_expired_sessions(&self.pool, now).or_db_error()?;
    if expired > 0 {
      debug!("Removed {} expired sessions", expired);
    }
    let session = Session {
      token: Uuid::new_v4().to_string(),
      user_id: user.id,
      expires_at: now + self.ttl
    };
    db::insert_session(&self.pool, &session).or_db_error()?;
    info!("User {} logged in", user.login);
    Ok(session)
  }

  // The account behind a live session, whatever its state.
  // Callers decide what an archived account may do.
  pub fn user_for_token(&self, token: &str) -> StoreResult<Option<User>> {
    match db::live_session(&self.pool, token, current_timestamp()).or_db_error()? {
      Some(session) => db::user_by_id(&self.pool, session.user_id).or_db_error(),
      None => Ok(None)
    }
  }

  pub fn close(&self, token: &str) -> StoreResult<bool> {
    let deleted = db::delete_session(&self.pool, token).or_db_error()?;
    Ok(deleted > 0)
  }

}
