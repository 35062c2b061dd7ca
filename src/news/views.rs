use std::net::IpAddr;
use log::debug;
use crate::db::{self, Pool, Page};
use crate::db::entities::ViewCount;
use crate::error::{StoreResult, OrDbError};
use crate::utils::time_utils::current_timestamp;

// One row per detail page render. No deduplication on
// purpose: the same visitor reading twice counts twice.
#[derive(Clone)]
pub struct ViewCountLedger {
  pool: Pool
}

impl ViewCountLedger {

  pub fn new(pool: Pool) -> Self {
    Self { pool }
  }

  pub fn record_view(&self, news_id: i64, ip_address: IpAddr) -> StoreResult<ViewCount> {
    let mut view = ViewCount {
      id: -1,
      news_id,
      ip_address: ip_address.to_string(),
      viewed_on: current_timestamp()
    };
    debug!("Recording view of article {} from {}", news_id, view.ip_address);
    view.id = db::insert_view_count(&self.pool, &view).or_db_error()?;
    Ok(view)
  }

  pub fn count(&self, news_id: i64) -> StoreResult<i64> {
    db::view_count_for_news(&self.pool, news_id).or_db_error()
  }

  // Most recent first.
  pub fn list(
    &self,
    news_id: Option<i64>,
    page: usize,
    per_page: usize
  ) -> StoreResult<Option<Page<ViewCount>>> {
    db::view_counts_page(&self.pool, news_id, page, per_page).or_db_error()
  }

}
