use chrono::NaiveDate;
use derive_more::Display;

// Rows as they come out of SQLite. Flags are stored as
// integers but I convert them to bool in the mappers.
// The DTOs in app::dtos are what actually gets sent out.

#[derive(Debug, Clone, PartialEq)]
pub struct Role {
  pub id: i64,
  pub title: String,
  pub is_archived: bool
}

// A persisted account is either live or archived, there is
// no "archived but active" combination. The unsaved state is
// the NewUser draft in the accounts module.
#[derive(Debug, Display, Clone, Copy, PartialEq)]
pub enum AccountStatus {
  #[display(fmt = "active")]
  Active,
  #[display(fmt = "archived")]
  Archived
}

impl AccountStatus {
  pub fn from_archived_flag(is_archived: bool) -> Self {
    if is_archived { AccountStatus::Archived } else { AccountStatus::Active }
  }

  pub fn is_archived(self) -> bool {
    self == AccountStatus::Archived
  }

  // The active flag is fully derived from the status.
  pub fn is_active(self) -> bool {
    self == AccountStatus::Active
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
  pub id: i64,
  pub name: String,
  pub email: String,
  pub login: String,
  pub date_of_birth: NaiveDate,
  pub role_id: Option<i64>,
  // Joined from the roles table, read-only.
  pub role_title: Option<String>,
  pub password: String,
  pub status: AccountStatus,
  pub is_staff: bool,
  pub is_superuser: bool,
  pub last_login: Option<i64>
}

impl User {
  pub fn is_active(&self) -> bool {
    self.status.is_active()
  }

  pub fn is_archived(&self) -> bool {
    self.status.is_archived()
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsArticle {
  pub id: i64,
  pub title: String,
  pub description: String,
  pub author_id: Option<i64>,
  pub author_name: Option<String>,
  pub date_of_create: i64,
  pub is_archived: bool
}

#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
  pub id: i64,
  pub path: String,
  pub news_id: Option<i64>,
  pub is_archived: bool
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewCount {
  pub id: i64,
  pub news_id: i64,
  pub ip_address: String,
  pub viewed_on: i64
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
  pub token: String,
  pub user_id: i64,
  pub expires_at: i64
}
