// storefront/src/services/notifier.rs

use crate::errors::{AppError, Result};
use crate::models::ProductNotification;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

/// Publishes "product created" notifications to subscribers.
#[async_trait]
pub trait Notifier: Send + Sync {
  async fn publish(&self, notification: &ProductNotification) -> Result<()>;
}

/// Writes each notification to the log as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
  async fn publish(&self, notification: &ProductNotification) -> Result<()> {
    let payload = serde_json::to_string(notification)
      .map_err(|e| AppError::Internal(format!("Failed to encode notification: {}", e)))?;
    info!(product_id = %notification.product.id, %payload, "Product notification published.");
    Ok(())
  }
}

/// Collects notifications in memory; used by tests.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
  published: Mutex<Vec<ProductNotification>>,
  failing: Mutex<bool>,
}

impl MemoryNotifier {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_failing(&self, failing: bool) {
    *self.failing.lock() = failing;
  }

  pub fn published(&self) -> Vec<ProductNotification> {
    self.published.lock().clone()
  }
}

#[async_trait]
impl Notifier for MemoryNotifier {
  async fn publish(&self, notification: &ProductNotification) -> Result<()> {
    if *self.failing.lock() {
      return Err(AppError::StoreUnavailable("notification topic unavailable".to_string()));
    }
    self.published.lock().push(notification.clone());
    Ok(())
  }
}
