use log::info;
use crate::db::{self, Pool, Page};
use crate::db::entities::{NewsArticle, User};
use crate::error::{StoreError, StoreResult, OrDbError, ValidationError};
use crate::accounts::validation::validate_not_blank;
use crate::utils::time_utils::current_timestamp;
pub mod pictures;
pub mod views;

// Admin form changes, None means untouched. author_id
// uses Some(None) to remove the author.
#[derive(Debug, Default, Clone)]
pub struct ArticleChanges {
  pub title: Option<String>,
  pub description: Option<String>,
  pub author_id: Option<Option<i64>>,
  pub is_archived: Option<bool>
}

#[derive(Clone)]
pub struct NewsStore {
  pool: Pool
}

impl NewsStore {

  pub fn new(pool: Pool) -> Self {
    Self { pool }
  }

  // The creation date is stamped here and nowhere else.
  pub fn publish(
    &self,
    title: &str,
    description: &str,
    author: Option<&User>
  ) -> StoreResult<NewsArticle> {
    let article = NewsArticle {
      id: -1,
      title: title.trim().to_string(),
      description: description.trim().to_string(),
      author_id: author.map(|a| a.id),
      author_name: None,
      date_of_create: current_timestamp(),
      is_archived: false
    };
    self.validate(&article)?;
    let id = db::insert_news(&self.pool, &article).or_db_error()?;
    info!("Published article {} ({})", article.title, id);
    self.get(id)
  }

  pub fn update(&self, news_id: i64, changes: ArticleChanges) -> StoreResult<NewsArticle> {
    let mut article = self.get(news_id)?;
    if let Some(title) = changes.title {
      article.title = title.trim().to_string();
    }
    if let Some(description) = changes.description {
      article.description = description.trim().to_string();
    }
    if let Some(author_id) = changes.author_id {
      article.author_id = author_id;
    }
    if let Some(is_archived) = changes.is_archived {
      article.is_archived = is_archived;
    }
    self.validate(&article)?;
    db::update_news(&self.pool, &article).or_db_error()?;
    self.get(news_id)
  }

  fn validate(&self, article: &NewsArticle) -> StoreResult<()> {
    validate_not_blank("title", &article.title)?;
    validate_not_blank("description", &article.description)?;
    if let Some(author_id) = article.author_id {
      if db::user_by_id(&self.pool, author_id).or_db_error()?.is_none() {
        return Err(ValidationError::format("author", "select a valid user").into());
      }
    }
    Ok(())
  }

  pub fn archive(&self, news_id: i64) -> StoreResult<NewsArticle> {
    self.set_archived(news_id, true)
  }

  pub fn unarchive(&self, news_id: i64) -> StoreResult<NewsArticle> {
    self.set_archived(news_id, false)
  }

  fn set_archived(&self, news_id: i64, is_archived: bool) -> StoreResult<NewsArticle> {
    let updated = db::set_news_archived(&self.pool, news_id, is_archived)
      .or_db_error()?;
    if updated == 0 {
      return Err(StoreError::NotFound("Article"));
    }
    info!("Article {} archived flag set to {}", news_id, is_archived);
    self.get(news_id)
  }

  pub fn get(&self, news_id: i64) -> StoreResult<NewsArticle> {
    db::news_by_id(&self.pool, news_id)
      .or_db_error()?
      .ok_or(StoreError::NotFound("Article"))
  }

  // What the public pages are allowed to show.
  pub fn get_published(&self, news_id: i64) -> StoreResult<NewsArticle> {
    match self.get(news_id)? {
      article if !article.is_archived => Ok(article),
      _ => Err(StoreError::NotFound("Article"))
    }
  }

  pub fn view_count(&self, news_id: i64) -> StoreResult<i64> {
    db::view_count_for_news(&self.pool, news_id).or_db_error()
  }

  pub fn latest(&self, max: usize) -> StoreResult<Vec<NewsArticle>> {
    db::latest_news(&self.pool, max).or_db_error()
  }

  pub fn published_page(
    &self,
    page: usize,
    per_page: usize
  ) -> StoreResult<Option<Page<NewsArticle>>> {
    db::published_news_page(&self.pool, page, per_page).or_db_error()
  }

  pub fn list(
    &self,
    search: Option<&str>,
    author_id: Option<i64>,
    page: usize,
    per_page: usize
  ) -> StoreResult<Option<Page<NewsArticle>>> {
    db::news_page(&self.pool, search, author_id, page, per_page).or_db_error()
  }

}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::{memory_pool, table_row_count, Table};

  #[test]
  fn publish_requires_title_and_description() {
    let store = NewsStore::new(memory_pool());
    match store.publish("  ", "text", None) {
      Err(StoreError::Validation(e)) => assert_eq!(e, ValidationError::ContentEmpty("title")),
      other => panic!("Expected an empty content error, got {:?}", other)
    }
    match store.publish("Title", "", None) {
      Err(StoreError::Validation(e)) => assert_eq!(e, ValidationError::ContentEmpty("description")),
      other => panic!("Expected an empty content error, got {:?}", other)
    }
  }

  #[test]
  fn creation_date_survives_updates() {
    let pool = memory_pool();
    let store = NewsStore::new(pool.clone());
    let id = db::insert_news(&pool, &NewsArticle {
      id: -1,
      title: String::from("Old news"),
      description: String::from("From a long time ago"),
      author_id: None,
      author_name: None,
      date_of_create: 1000,
      is_archived: false
    }).unwrap();
    let first = store.update(id, ArticleChanges {
      title: Some(String::from("Still old news")),
      ..Default::default()
    }).unwrap();
    let second = store.update(id, ArticleChanges::default()).unwrap();
    assert_eq!(first.date_of_create, 1000);
    assert_eq!(second.date_of_create, 1000);
    assert_eq!(second.title, "Still old news");
  }

  #[test]
  fn publish_stamps_current_time() {
    let store = NewsStore::new(memory_pool());
    let before = current_timestamp();
    let article = store.publish("Title", "Text", None).unwrap();
    assert!(article.date_of_create >= before);
    assert!(!article.is_archived);
  }

  #[test]
  fn unknown_author_is_rejected() {
    let store = NewsStore::new(memory_pool());
    let article = store.publish("Title", "Text", None).unwrap();
    let result = store.update(article.id, ArticleChanges {
      author_id: Some(Some(12)),
      ..Default::default()
    });
    assert!(matches!(result, Err(StoreError::Validation(ValidationError::FormatViolation { field: "author", .. }))));
  }

  #[test]
  fn archive_keeps_the_row_and_hides_the_article() {
    let pool = memory_pool();
    let store = NewsStore::new(pool.clone());
    let article = store.publish("Title", "Text", None).unwrap();
    assert!(store.archive(article.id).unwrap().is_archived);
    assert_eq!(table_row_count(&pool, Table::News).unwrap(), 1);
    assert!(matches!(store.get_published(article.id), Err(StoreError::NotFound(_))));
    assert!(store.latest(4).unwrap().is_empty());
    assert!(!store.unarchive(article.id).unwrap().is_archived);
  }

  #[test]
  fn latest_is_newest_first_and_capped() {
    let store = NewsStore::new(memory_pool());
    for i in 0..6 {
      store.publish(&format!("News {}", i), "Text", None).unwrap();
    }
    let latest = store.latest(4).unwrap();
    let titles: Vec<&str> = latest.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["News 5", "News 4", "News 3", "News 2"]);
  }

  #[test]
  fn published_pages_skip_archived_articles() {
    let store = NewsStore::new(memory_pool());
    let mut ids = Vec::new();
    for i in 0..12 {
      ids.push(store.publish(&format!("News {}", i), "Text", None).unwrap().id);
    }
    store.archive(ids[0]).unwrap();
    store.archive(ids[1]).unwrap();
    let page = store.published_page(1, 8).unwrap().unwrap();
    assert_eq!(page.total, 10);
    assert_eq!(page.items.len(), 8);
    assert_eq!(page.items[0].title, "News 11");
    let second = store.published_page(2, 8).unwrap().unwrap();
    assert_eq!(second.items.len(), 2);
    assert_eq!(second.items[1].title, "News 2");
    assert!(store.published_page(3, 8).unwrap().is_none());
  }

  #[test]
  fn admin_list_searches_titles() {
    let store = NewsStore::new(memory_pool());
    store.publish("Погода", "Text", None).unwrap();
    store.publish("Sports", "Text", None).unwrap();
    let page = store.list(Some("port"), None, 1, 10).unwrap().unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].title, "Sports");
  }
}
