// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use flow::FlowError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Authentication Required: {0}")]
  Auth(String),

  #[error("Access Denied: {0}")]
  Forbidden(String),

  /// Transient backend failure; callers may retry.
  #[error("Store Unavailable: {0}")]
  StoreUnavailable(String),

  /// The Product+Stock transaction was rejected as a whole.
  #[error("Atomic Write Failed: {0}")]
  AtomicWrite(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Whether redelivering the same work can succeed.
  pub fn is_retryable(&self) -> bool {
    match self {
      AppError::StoreUnavailable(_) | AppError::AtomicWrite(_) => true,
      AppError::Sqlx(err) => is_transient_sqlx_error(err),
      AppError::Workflow { source } => matches!(source, FlowError::HandlerError { .. }),
      _ => false,
    }
  }
}

/// Connection, pool and concurrency failures clear up on their own; decode
/// errors and constraint violations repeat on every attempt.
fn is_transient_sqlx_error(err: &sqlx::Error) -> bool {
  match err {
    sqlx::Error::Io(_)
    | sqlx::Error::Tls(_)
    | sqlx::Error::Protocol(_)
    | sqlx::Error::PoolTimedOut
    | sqlx::Error::PoolClosed
    | sqlx::Error::WorkerCrashed => true,
    sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| is_transient_sqlstate(&code)),
    _ => false,
  }
}

// Class 08 connection exceptions, class 53 insufficient resources,
// serialization failure, deadlock, lock not available and server shutdown.
fn is_transient_sqlstate(code: &str) -> bool {
  code.starts_with("08")
    || code.starts_with("53")
    || matches!(code, "40001" | "40P01" | "55P03" | "57P01" | "57P02" | "57P03")
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(err) => AppError::Internal(err.to_string()),
    }
  }
}

impl From<std::io::Error> for AppError {
  fn from(err: std::io::Error) -> Self {
    AppError::StoreUnavailable(format!("I/O failure: {}", err))
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    let message = match self {
      AppError::Validation(m) | AppError::NotFound(m) | AppError::Auth(m) | AppError::Forbidden(m) => m.clone(),
      _ => "Internal server error".to_string(),
    };
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with client error");
    }
    HttpResponse::build(status).json(json!({ "message": message }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
