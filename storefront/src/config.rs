// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
      "memory" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!("Unknown STORE_BACKEND '{}'", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

/// Where uploads land, where they move after parsing, and how often the
/// incoming prefix is scanned.
#[derive(Debug, Clone)]
pub struct ImportConfig {
  pub incoming_prefix: String,
  pub processed_prefix: String,
  pub placeholder_name: String,
  pub poll_interval: Duration,
}

impl ImportConfig {
  pub fn placeholder_key(&self) -> String {
    format!("{}{}", self.incoming_prefix, self.placeholder_name)
  }
}

impl Default for ImportConfig {
  fn default() -> Self {
    Self {
      incoming_prefix: "incoming/".to_string(),
      processed_prefix: "processed/".to_string(),
      placeholder_name: ".keep".to_string(),
      poll_interval: Duration::from_millis(2000),
    }
  }
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
  pub batch_size: usize,
  pub poll_interval: Duration,
  pub max_receives: u32,
}

impl Default for QueueConfig {
  fn default() -> Self {
    Self {
      batch_size: 5,
      poll_interval: Duration::from_millis(500),
      max_receives: 5,
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub db_max_connections: u32,
  pub run_migrations: bool,
  pub object_store_root: String,
  pub import: ImportConfig,
  pub queue: QueueConfig,
  /// Raw `user:password` pairs, comma separated.
  pub cart_credentials: String,
  pub log_format: LogFormat,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      store_backend: StoreBackend::Postgres,
      database_url: None,
      db_max_connections: 5,
      run_migrations: true,
      object_store_root: "./data/objects".to_string(),
      import: ImportConfig::default(),
      queue: QueueConfig::default(),
      cart_credentials: String::new(),
      log_format: LogFormat::Text,
    }
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source; `from_env` passes the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let defaults = AppConfig::default();
    let get_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

    let server_host = get_or("SERVER_HOST", &defaults.server_host);
    let server_port = parse_var::<u16>("SERVER_PORT", &get_or("SERVER_PORT", "8080"))?;
    let store_backend = match lookup("STORE_BACKEND") {
      Some(raw) => raw.parse::<StoreBackend>()?,
      None => defaults.store_backend,
    };
    let database_url = lookup("DATABASE_URL");
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required when STORE_BACKEND=postgres)".to_string(),
      ));
    }
    let db_max_connections = parse_var::<u32>("DB_MAX_CONNECTIONS", &get_or("DB_MAX_CONNECTIONS", "5"))?;
    let run_migrations = parse_var::<bool>("RUN_MIGRATIONS", &get_or("RUN_MIGRATIONS", "true"))?;
    let object_store_root = get_or("OBJECT_STORE_ROOT", &defaults.object_store_root);

    let import = ImportConfig {
      incoming_prefix: normalize_prefix(&get_or("IMPORT_INCOMING_PREFIX", "incoming/")),
      processed_prefix: normalize_prefix(&get_or("IMPORT_PROCESSED_PREFIX", "processed/")),
      placeholder_name: get_or("IMPORT_PLACEHOLDER_NAME", ".keep"),
      poll_interval: Duration::from_millis(parse_var::<u64>(
        "IMPORT_POLL_INTERVAL_MS",
        &get_or("IMPORT_POLL_INTERVAL_MS", "2000"),
      )?),
    };
    if import.incoming_prefix == import.processed_prefix {
      return Err(AppError::Config(
        "IMPORT_INCOMING_PREFIX and IMPORT_PROCESSED_PREFIX must differ".to_string(),
      ));
    }

    let batch_size = parse_var::<usize>("CATALOG_BATCH_SIZE", &get_or("CATALOG_BATCH_SIZE", "5"))?;
    if !(1..=10).contains(&batch_size) {
      return Err(AppError::Config(format!(
        "CATALOG_BATCH_SIZE must be between 1 and 10, got {}",
        batch_size
      )));
    }
    let queue = QueueConfig {
      batch_size,
      poll_interval: Duration::from_millis(parse_var::<u64>(
        "QUEUE_POLL_INTERVAL_MS",
        &get_or("QUEUE_POLL_INTERVAL_MS", "500"),
      )?),
      max_receives: parse_var::<u32>("QUEUE_MAX_RECEIVES", &get_or("QUEUE_MAX_RECEIVES", "5"))?.max(1),
    };

    let cart_credentials = get_or("CART_CREDENTIALS", "");
    let log_format = match get_or("LOG_FORMAT", "text").to_ascii_lowercase().as_str() {
      "json" => LogFormat::Json,
      "text" => LogFormat::Text,
      other => return Err(AppError::Config(format!("Unknown LOG_FORMAT '{}'", other))),
    };

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      db_max_connections,
      run_migrations,
      object_store_root,
      import,
      queue,
      cart_credentials,
      log_format,
    })
  }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e)))
}

fn normalize_prefix(raw: &str) -> String {
  let trimmed = raw.trim().trim_start_matches('/');
  if trimmed.ends_with('/') {
    trimmed.to_string()
  } else {
    format!("{}/", trimmed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| map.get(name).cloned()
  }

  #[test]
  fn memory_backend_needs_no_database_url() {
    let config = AppConfig::from_lookup(lookup_from(&[("STORE_BACKEND", "memory")])).unwrap();
    assert_eq!(config.store_backend, StoreBackend::Memory);
    assert_eq!(config.queue.batch_size, 5);
    assert_eq!(config.import.placeholder_key(), "incoming/.keep");
  }

  #[test]
  fn postgres_backend_requires_database_url() {
    let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
    assert!(matches!(err, AppError::Config(m) if m.contains("DATABASE_URL")));
  }

  #[test]
  fn default_backend_matches_unset_variable() {
    let config = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/shop")])).unwrap();
    assert_eq!(config.store_backend, AppConfig::default().store_backend);
    assert_eq!(config.store_backend, StoreBackend::Postgres);
  }

  #[test]
  fn prefixes_are_normalized() {
    let config = AppConfig::from_lookup(lookup_from(&[
      ("STORE_BACKEND", "memory"),
      ("IMPORT_INCOMING_PREFIX", "/uploaded"),
      ("IMPORT_PROCESSED_PREFIX", "parsed/"),
    ]))
    .unwrap();
    assert_eq!(config.import.incoming_prefix, "uploaded/");
    assert_eq!(config.import.processed_prefix, "parsed/");
  }

  #[test]
  fn batch_size_out_of_range_is_rejected() {
    let err = AppConfig::from_lookup(lookup_from(&[("STORE_BACKEND", "memory"), ("CATALOG_BATCH_SIZE", "50")]));
    assert!(matches!(err, Err(AppError::Config(_))));
  }
}
