// storefront/src/services/object_store.rs

//! Keyed blob storage for uploaded catalog files.
//!
//! Keys are `/`-separated paths such as `incoming/products.csv`. The
//! filesystem backend maps them under a root directory; the memory backend
//! keeps them in a map and can be told to fail copies.

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, instrument};

#[async_trait]
pub trait ObjectStore: Send + Sync {
  /// Object body, or `NotFound`.
  async fn get(&self, key: &str) -> Result<Vec<u8>>;
  async fn put(&self, key: &str, body: Vec<u8>) -> Result<()>;
  async fn copy(&self, from_key: &str, to_key: &str) -> Result<()>;
  /// Deleting a missing key succeeds.
  async fn delete(&self, key: &str) -> Result<()>;
  async fn exists(&self, key: &str) -> Result<bool>;
  /// All keys starting with `prefix`, sorted.
  async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

#[derive(Debug, Clone)]
pub struct FsObjectStore {
  root: PathBuf,
}

impl FsObjectStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  fn resolve(&self, key: &str) -> Result<PathBuf> {
    let relative = Path::new(key);
    let is_plain = !key.is_empty()
      && relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !is_plain {
      return Err(AppError::Validation(format!("Invalid object key '{}'", key)));
    }
    Ok(self.root.join(relative))
  }

  async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
  }

  fn key_for(&self, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(&self.root).ok()?;
    let parts: Vec<&str> = relative
      .components()
      .map(|c| c.as_os_str().to_str())
      .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
  }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
  #[instrument(name = "FsObjectStore::get", skip(self))]
  async fn get(&self, key: &str) -> Result<Vec<u8>> {
    let path = self.resolve(key)?;
    match tokio::fs::read(&path).await {
      Ok(body) => Ok(body),
      Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::NotFound(format!("Object '{}' not found", key))),
      Err(e) => Err(e.into()),
    }
  }

  #[instrument(name = "FsObjectStore::put", skip(self, body), fields(len = body.len()))]
  async fn put(&self, key: &str, body: Vec<u8>) -> Result<()> {
    let path = self.resolve(key)?;
    Self::ensure_parent(&path).await?;
    tokio::fs::write(&path, body).await?;
    Ok(())
  }

  #[instrument(name = "FsObjectStore::copy", skip(self))]
  async fn copy(&self, from_key: &str, to_key: &str) -> Result<()> {
    let from = self.resolve(from_key)?;
    let to = self.resolve(to_key)?;
    Self::ensure_parent(&to).await?;
    match tokio::fs::copy(&from, &to).await {
      Ok(bytes) => {
        debug!(bytes, "Object copied.");
        Ok(())
      }
      Err(e) if e.kind() == ErrorKind::NotFound => {
        Err(AppError::NotFound(format!("Object '{}' not found", from_key)))
      }
      Err(e) => Err(e.into()),
    }
  }

  #[instrument(name = "FsObjectStore::delete", skip(self))]
  async fn delete(&self, key: &str) -> Result<()> {
    let path = self.resolve(key)?;
    match tokio::fs::remove_file(&path).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }

  async fn exists(&self, key: &str) -> Result<bool> {
    let path = self.resolve(key)?;
    Ok(tokio::fs::try_exists(&path).await?)
  }

  #[instrument(name = "FsObjectStore::list", skip(self))]
  async fn list(&self, prefix: &str) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    let mut pending = vec![self.root.clone()];

    while let Some(dir) = pending.pop() {
      let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => continue,
        Err(e) => return Err(e.into()),
      };
      while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_dir() {
          pending.push(path);
        } else if let Some(key) = self.key_for(&path) {
          if key.starts_with(prefix) {
            keys.push(key);
          }
        }
      }
    }

    keys.sort();
    Ok(keys)
  }
}

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
  objects: Mutex<BTreeMap<String, Vec<u8>>>,
  fail_copies: Mutex<bool>,
}

impl MemoryObjectStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes `copy` fail with `StoreUnavailable` until reset.
  pub fn set_fail_copies(&self, fail: bool) {
    *self.fail_copies.lock() = fail;
  }

  pub fn keys(&self) -> Vec<String> {
    self.objects.lock().keys().cloned().collect()
  }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
  async fn get(&self, key: &str) -> Result<Vec<u8>> {
    self
      .objects
      .lock()
      .get(key)
      .cloned()
      .ok_or_else(|| AppError::NotFound(format!("Object '{}' not found", key)))
  }

  async fn put(&self, key: &str, body: Vec<u8>) -> Result<()> {
    self.objects.lock().insert(key.to_string(), body);
    Ok(())
  }

  async fn copy(&self, from_key: &str, to_key: &str) -> Result<()> {
    if *self.fail_copies.lock() {
      return Err(AppError::StoreUnavailable(format!("copy of '{}' refused", from_key)));
    }
    let mut objects = self.objects.lock();
    let body = objects
      .get(from_key)
      .cloned()
      .ok_or_else(|| AppError::NotFound(format!("Object '{}' not found", from_key)))?;
    objects.insert(to_key.to_string(), body);
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<()> {
    self.objects.lock().remove(key);
    Ok(())
  }

  async fn exists(&self, key: &str) -> Result<bool> {
    Ok(self.objects.lock().contains_key(key))
  }

  async fn list(&self, prefix: &str) -> Result<Vec<String>> {
    Ok(
      self
        .objects
        .lock()
        .keys()
        .filter(|k| k.starts_with(prefix))
        .cloned()
        .collect(),
    )
  }
}
