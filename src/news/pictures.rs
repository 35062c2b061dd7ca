use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use log::{info, warn};
use crate::db::{self, Pool, Page};
use crate::db::entities::Picture;
use crate::error::{StoreError, StoreResult, OrDbError, ValidationError};

// Uploads land in <media_root>/static/img/ and the row
// stores the path relative to the media root.
pub const UPLOAD_DIR: &'static str = "static/img";
pub const ALLOWED_EXTENSIONS: [&'static str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Default, Clone)]
pub struct PictureChanges {
  pub news_id: Option<Option<i64>>,
  pub is_archived: Option<bool>
}

#[derive(Clone)]
pub struct PictureStore {
  pool: Pool,
  media_root: PathBuf
}

impl PictureStore {

  pub fn new(pool: Pool, media_root: &str) -> Self {
    Self {
      pool,
      media_root: PathBuf::from(media_root)
    }
  }

  // Validates the extension before anything touches the disk.
  pub fn attach(
    &self,
    file_name: &str,
    content: &[u8],
    news_id: Option<i64>
  ) -> StoreResult<Picture> {
    let file_name = sanitize_file_name(file_name)?;
    validate_extension(&file_name)?;
    if let Some(news_id) = news_id {
      self.validate_news(news_id)?;
    }
    let upload_dir = self.media_root.join(UPLOAD_DIR);
    fs::create_dir_all(&upload_dir)
      .map_err(|e| StoreError::Internal(format!("Cannot create upload directory - {}", e)))?;
    let (stored_name, stored_path) = write_new_file(&upload_dir, &file_name, content)?;

    let mut picture = Picture {
      id: -1,
      path: format!("{}/{}", UPLOAD_DIR, stored_name),
      news_id,
      is_archived: false
    };
    picture.id = match db::insert_picture(&self.pool, &picture).or_db_error() {
      Ok(id) => id,
      Err(e) => {
        // No row, no file.
        if let Err(rm) = fs::remove_file(&stored_path) {
          warn!("Could not remove orphan picture {} - {}", stored_path.display(), rm);
        }
        return Err(e);
      }
    };
    info!("Stored picture {} ({} bytes)", picture.path, content.len());
    Ok(picture)
  }

  pub fn update(&self, picture_id: i64, changes: PictureChanges) -> StoreResult<Picture> {
    let mut picture = self.get(picture_id)?;
    if let Some(news_id) = changes.news_id {
      if let Some(id) = news_id {
        self.validate_news(id)?;
      }
      picture.news_id = news_id;
    }
    if let Some(is_archived) = changes.is_archived {
      picture.is_archived = is_archived;
    }
    db::update_picture(&self.pool, &picture).or_db_error()?;
    self.get(picture_id)
  }

  fn validate_news(&self, news_id: i64) -> StoreResult<()> {
    if db::news_exists(&self.pool, news_id).or_db_error()? {
      Ok(())
    } else {
      Err(ValidationError::format("news", "select a valid article").into())
    }
  }

  // Archived pictures keep their file too.
  pub fn archive(&self, picture_id: i64) -> StoreResult<Picture> {
    self.set_archived(picture_id, true)
  }

  pub fn unarchive(&self, picture_id: i64) -> StoreResult<Picture> {
    self.set_archived(picture_id, false)
  }

  fn set_archived(&self, picture_id: i64, is_archived: bool) -> StoreResult<Picture> {
    let updated = db::set_picture_archived(&self.pool, picture_id, is_archived)
      .or_db_error()?;
    if updated == 0 {
      return Err(StoreError::NotFound("Picture"));
    }
    info!("Picture {} archived flag set to {}", picture_id, is_archived);
    self.get(picture_id)
  }

  pub fn get(&self, picture_id: i64) -> StoreResult<Picture> {
    db::picture_by_id(&self.pool, picture_id)
      .or_db_error()?
      .ok_or(StoreError::NotFound("Picture"))
  }

  pub fn for_article(&self, news_id: i64) -> StoreResult<Vec<Picture>> {
    db::pictures_for_news(&self.pool, news_id).or_db_error()
  }

  pub fn list(
    &self,
    search: Option<&str>,
    news_id: Option<i64>,
    page: usize,
    per_page: usize
  ) -> StoreResult<Option<Page<Picture>>> {
    db::pictures_page(&self.pool, search, news_id, page, per_page).or_db_error()
  }

  // Where a stored picture lives on disk, for serving it.
  // Only bare file names are accepted.
  pub fn stored_file(&self, file_name: &str) -> Option<PathBuf> {
    if file_name.is_empty() || file_name.contains('/') || file_name.contains('\\')
      || file_name.starts_with('.') {
      return None;
    }
    let path = self.media_root.join(UPLOAD_DIR).join(file_name);
    if path.is_file() { Some(path) } else { None }
  }

}

pub fn validate_extension(file_name: &str) -> Result<(), ValidationError> {
  let extension = Path::new(file_name)
    .extension()
    .and_then(|e| e.to_str())
    .map(|e| e.to_lowercase());
  match extension {
    Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
    _ => Err(ValidationError::format(
      "path",
      &format!("only {} images are allowed", ALLOWED_EXTENSIONS.join(", "))
    ))
  }
}

// Keeps the last path component only and gets rid of spaces.
fn sanitize_file_name(file_name: &str) -> Result<String, ValidationError> {
  let name = file_name.rsplit(|c| c == '/' || c == '\\')
    .next()
    .unwrap_or("")
    .trim();
  if name.is_empty() || name.starts_with('.') {
    return Err(ValidationError::MissingField("path"));
  }
  Ok(name.split_whitespace().collect::<Vec<&str>>().join("_"))
}

// "photo.png", then "photo_1.png", "photo_2.png" and so on.
fn candidate_file_name(file_name: &str, counter: usize) -> String {
  if counter == 0 {
    return file_name.to_string();
  }
  let path = Path::new(file_name);
  let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("picture");
  match path.extension().and_then(|e| e.to_str()) {
    Some(extension) => format!("{}_{}.{}", stem, counter, extension),
    None => format!("{}_{}", stem, counter)
  }
}

// create_new fails on an existing file, so two uploads with
// the same name can't end up writing to the same path.
fn write_new_file(dir: &Path, file_name: &str, content: &[u8]) -> StoreResult<(String, PathBuf)> {
  let mut counter = 0;
  loop {
    let candidate = candidate_file_name(file_name, counter);
    let path = dir.join(&candidate);
    match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
      Ok(mut file) => {
        if let Err(e) = file.write_all(content) {
          drop(file);
          let _ = fs::remove_file(&path);
          return Err(StoreError::Internal(format!("Cannot write picture {} - {}", candidate, e)));
        }
        return Ok((candidate, path));
      },
      Err(e) if e.kind() == ErrorKind::AlreadyExists => counter += 1,
      Err(e) => return Err(
        StoreError::Internal(format!("Cannot write picture {} - {}", candidate, e))
      )
    }
  }
}
