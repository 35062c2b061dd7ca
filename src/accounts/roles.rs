use log::info;
use crate::db::{self, Pool, Page};
use crate::db::entities::Role;
use crate::error::{StoreError, StoreResult, OrDbError, ValidationError};
use super::validation::validate_role_title;

// Role given to accounts that don't have one.
pub const DEFAULT_ROLE: &'static str = "Client";
// Default for accounts created through create_superuser.
pub const ADMIN_ROLE: &'static str = "Administrator";

// Anything the account manager can ask for a role by title.
// It's a trait so the manager doesn't have to know where
// roles come from.
pub trait RoleResolver {
  fn resolve(&self, title: &str) -> StoreResult<Role>;
  fn find(&self, role_id: i64) -> StoreResult<Option<Role>>;
}

#[derive(Clone)]
pub struct RoleRegistry {
  pool: Pool
}

impl RoleRegistry {

  pub fn new(pool: Pool) -> Self {
    Self { pool }
  }

  // Idempotent lookup-or-create. Archived roles are still
  // returned, archival doesn't free the title.
  pub fn create_or_get(&self, title: &str) -> StoreResult<Role> {
    let title = title.trim();
    match db::role_by_title(&self.pool, title).or_db_error()? {
      Some(role) => Ok(role),
      None => self.create(title)
    }
  }

  pub fn create(&self, title: &str) -> StoreResult<Role> {
    let title = title.trim();
    self.validate(title, None)?;
    let id = db::insert_role(&self.pool, title).or_db_error()?;
    info!("Created role {} ({})", title, id);
    self.get(id)
  }

  pub fn rename(&self, role_id: i64, title: &str) -> StoreResult<Role> {
    let title = title.trim();
    self.get(role_id)?;
    self.validate(title, Some(role_id))?;
    db::update_role_title(&self.pool, role_id, title).or_db_error()?;
    self.get(role_id)
  }

  pub fn get(&self, role_id: i64) -> StoreResult<Role> {
    db::role_by_id(&self.pool, role_id)
      .or_db_error()?
      .ok_or(StoreError::NotFound("Role"))
  }

  // Deleting a role means archiving it.
  pub fn archive(&self, role_id: i64) -> StoreResult<Role> {
    self.set_archived(role_id, true)
  }

  pub fn unarchive(&self, role_id: i64) -> StoreResult<Role> {
    self.set_archived(role_id, false)
  }

  fn set_archived(&self, role_id: i64, is_archived: bool) -> StoreResult<Role> {
    let updated = db::set_role_archived(&self.pool, role_id, is_archived)
      .or_db_error()?;
    if updated == 0 {
      return Err(StoreError::NotFound("Role"));
    }
    info!("Role {} archived flag set to {}", role_id, is_archived);
    self.get(role_id)
  }

  pub fn list(
    &self,
    search: Option<&str>,
    page: usize,
    per_page: usize
  ) -> StoreResult<Option<Page<Role>>> {
    db::roles_page(&self.pool, search, page, per_page).or_db_error()
  }

  fn validate(&self, title: &str, except_id: Option<i64>) -> StoreResult<()> {
    validate_role_title(title)?;
    if db::role_title_taken(&self.pool, title, except_id).or_db_error()? {
      return Err(ValidationError::taken("title", title).into());
    }
    Ok(())
  }

}

impl RoleResolver for RoleRegistry {
  fn resolve(&self, title: &str) -> StoreResult<Role> {
    self.create_or_get(title)
  }

  fn find(&self, role_id: i64) -> StoreResult<Option<Role>> {
    db::role_by_id(&self.pool, role_id).or_db_error()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::{memory_pool, table_row_count, Table};

  #[test]
  fn create_or_get_is_idempotent() {
    let registry = RoleRegistry::new(memory_pool());
    let first = registry.create_or_get(DEFAULT_ROLE).unwrap();
    let second = registry.create_or_get(DEFAULT_ROLE).unwrap();
    assert_eq!(first, second);
    assert_eq!(table_row_count(&registry.pool, Table::Roles).unwrap(), 1);
  }

  #[test]
  fn short_titles_are_rejected() {
    let registry = RoleRegistry::new(memory_pool());
    match registry.create("ab") {
      Err(StoreError::Validation(ValidationError::RangeViolation { field, .. })) =>
        assert_eq!(field, "title"),
      other => panic!("Expected a range violation, got {:?}", other)
    }
  }

  #[test]
  fn duplicate_titles_are_rejected() {
    let registry = RoleRegistry::new(memory_pool());
    registry.create("Editor").unwrap();
    match registry.create("Editor") {
      Err(StoreError::Validation(e)) => assert_eq!(e, ValidationError::taken("title", "Editor")),
      other => panic!("Expected a uniqueness violation, got {:?}", other)
    }
  }

  #[test]
  fn rename_to_own_title_is_allowed() {
    let registry = RoleRegistry::new(memory_pool());
    let role = registry.create("Editor").unwrap();
    let other = registry.create("Writer").unwrap();
    assert_eq!(registry.rename(role.id, "Editor").unwrap().title, "Editor");
    assert!(registry.rename(other.id, "Editor").is_err());
  }

  #[test]
  fn archive_keeps_the_row() {
    let registry = RoleRegistry::new(memory_pool());
    let role = registry.create("Editor").unwrap();
    let archived = registry.archive(role.id).unwrap();
    assert!(archived.is_archived);
    assert_eq!(table_row_count(&registry.pool, Table::Roles).unwrap(), 1);
    assert!(!registry.unarchive(role.id).unwrap().is_archived);
  }

  #[test]
  fn archive_unknown_role() {
    let registry = RoleRegistry::new(memory_pool());
    assert!(matches!(registry.archive(42), Err(StoreError::NotFound("Role"))));
  }

  #[test]
  fn list_searches_titles_in_order() {
    let registry = RoleRegistry::new(memory_pool());
    for title in &["Writer", "Editor", "Client"] {
      registry.create(title).unwrap();
    }
    let page = registry.list(None, 1, 10).unwrap().unwrap();
    let titles: Vec<String> = page.items.into_iter().map(|r| r.title).collect();
    assert_eq!(titles, vec!["Client", "Editor", "Writer"]);
    let page = registry.list(Some("rit"), 1, 10).unwrap().unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].title, "Writer");
  }
}
