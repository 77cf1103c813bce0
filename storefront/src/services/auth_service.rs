// storefront/src/services/auth_service.rs

//! HTTP Basic authorization for the cart endpoints.

use crate::errors::{AppError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// Source of truth for which user/password pairs may use the cart API.
pub trait CredentialStore: Send + Sync {
  fn verify(&self, username: &str, password: &str) -> bool;
}

/// Credentials loaded once from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
  credentials: HashMap<String, String>,
}

impl StaticCredentialStore {
  /// Parses `user:password` pairs separated by commas. Blank entries are
  /// skipped; an entry without `:` or with an empty user name is a config error.
  pub fn from_config(raw: &str) -> Result<Self> {
    let mut credentials = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
      let (username, password) = entry
        .split_once(':')
        .ok_or_else(|| AppError::Config("CART_CREDENTIALS entries must look like user:password".to_string()))?;
      if username.trim().is_empty() {
        return Err(AppError::Config("CART_CREDENTIALS contains an empty user name".to_string()));
      }
      credentials.insert(username.trim().to_string(), password.to_string());
    }
    Ok(Self { credentials })
  }

  pub fn len(&self) -> usize {
    self.credentials.len()
  }

  pub fn is_empty(&self) -> bool {
    self.credentials.is_empty()
  }
}

impl CredentialStore for StaticCredentialStore {
  fn verify(&self, username: &str, password: &str) -> bool {
    self
      .credentials
      .get(username)
      .is_some_and(|stored| stored == password)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
  pub username: String,
  pub password: String,
}

/// Decodes an `Authorization: Basic <base64(user:password)>` header value.
///
/// # Errors
/// `AppError::Forbidden` when the scheme is not Basic, the token is not valid
/// base64 or UTF-8, or the decoded text has no `:` separator.
pub fn decode_basic_header(header_value: &str) -> Result<BasicCredentials> {
  let token = header_value
    .trim()
    .strip_prefix("Basic ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or_else(|| AppError::Forbidden("Unsupported authorization scheme".to_string()))?;

  let decoded = STANDARD
    .decode(token)
    .map_err(|_| AppError::Forbidden("Malformed authorization token".to_string()))?;
  let text = String::from_utf8(decoded).map_err(|_| AppError::Forbidden("Malformed authorization token".to_string()))?;

  let (username, password) = text
    .split_once(':')
    .ok_or_else(|| AppError::Forbidden("Malformed authorization token".to_string()))?;

  Ok(BasicCredentials {
    username: username.to_string(),
    password: password.to_string(),
  })
}

/// Resolves the caller's user id from the raw `Authorization` header.
///
/// # Returns
/// The user name on success; `AppError::Auth` (401) when the header is
/// missing; `AppError::Forbidden` (403) when it is malformed or rejected.
#[instrument(name = "auth_service::authorize", skip_all, err(Display))]
pub fn authorize(credentials: &dyn CredentialStore, header_value: Option<&str>) -> Result<String> {
  let header_value = header_value.ok_or_else(|| AppError::Auth("Authorization header is required".to_string()))?;
  let BasicCredentials { username, password } = decode_basic_header(header_value)?;

  debug!(user = %username, "Attempting to authorize user.");
  if credentials.verify(&username, &password) {
    Ok(username)
  } else {
    warn!(user = %username, "Authorization failed: invalid credentials.");
    Err(AppError::Forbidden("Invalid credentials".to_string()))
  }
}

/// `Basic` header value for the given pair. Used by clients and tests.
pub fn encode_basic_header(username: &str, password: &str) -> String {
  format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}
