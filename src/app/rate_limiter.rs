use crate::utils::time_utils::current_timestamp;

/**
 * Counts calls to the login endpoint per unit of time and
 * blocks it entirely for block_duration seconds once
 * max_requests is reached inside the window.
 */
pub struct BasicRateLimiter {
  counter: u32,
  last_update: i64,
  is_limited: bool,
  max_requests: u32,
  max_requests_time: u32,
  block_duration: u32
}

impl BasicRateLimiter {

  pub fn new(
    max_requests: u32,
    max_requests_time: u32,
    block_duration: u32
  ) -> Self {
    Self::starting_at(max_requests, max_requests_time, block_duration, current_timestamp())
  }

  fn starting_at(
    max_requests: u32,
    max_requests_time: u32,
    block_duration: u32,
    now: i64
  ) -> Self {
    Self {
      counter: 0,
      last_update: now,
      is_limited: false,
      max_requests,
      max_requests_time,
      block_duration
    }
  }

  pub fn is_locked(&self) -> bool {
    self.is_limited
  }

  pub fn is_expired(&self) -> bool {
    self.is_expired_at(current_timestamp())
  }

  // Locked: past block_duration. Otherwise: past the window.
  fn is_expired_at(&self, now: i64) -> bool {
    if self.is_locked() {
      now - self.last_update >= self.block_duration.into()
    } else {
      now - self.last_update >= self.max_requests_time.into()
    }
  }

  // Counts one request, returns true when the caller
  // should be turned away.
  pub fn update(&mut self) -> bool {
    self.update_at(current_timestamp())
  }

  fn update_at(&mut self, now: i64) -> bool {
    if self.is_expired_at(now) {
      self.counter = 1;
      self.last_update = now;
      self.is_limited = false;
    } else if !self.is_limited {
      self.counter += 1;
      if self.counter > self.max_requests {
        self.is_limited = true;
        self.last_update = now;
      }
    }
    self.is_limited
  }

}
