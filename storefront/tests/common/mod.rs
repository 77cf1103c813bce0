// storefront/tests/common/mod.rs
#![allow(dead_code)]

pub mod pg;

use once_cell::sync::Lazy;
use std::sync::Arc;
use storefront::config::{AppConfig, QueueConfig, StoreBackend};
use storefront::models::{ImportBatchMessage, ProductSnapshot};
use storefront::services::auth_service::StaticCredentialStore;
use storefront::services::notifier::MemoryNotifier;
use storefront::services::object_store::MemoryObjectStore;
use storefront::services::queue::MemoryQueue;
use storefront::state::{AppState, Backends};
use storefront::stores::{MemoryCartStore, MemoryCatalogStore};
use tracing::Level;

pub const MAX_RECEIVES: u32 = 3;

/// An `AppState` on in-memory backends, with typed handles kept for
/// inspection and failure injection.
pub struct TestApp {
  pub state: AppState,
  pub carts: Arc<MemoryCartStore>,
  pub catalog: Arc<MemoryCatalogStore>,
  pub objects: Arc<MemoryObjectStore>,
  pub queue: Arc<MemoryQueue>,
  pub notifier: Arc<MemoryNotifier>,
}

pub fn test_config() -> AppConfig {
  AppConfig {
    store_backend: StoreBackend::Memory,
    cart_credentials: "alice:TEST_PASSWORD,bob:hunter2".to_string(),
    queue: QueueConfig {
      max_receives: MAX_RECEIVES,
      ..QueueConfig::default()
    },
    ..AppConfig::default()
  }
}

pub fn test_app() -> TestApp {
  setup_tracing();
  let config = test_config();

  let carts = Arc::new(MemoryCartStore::new());
  let catalog = Arc::new(MemoryCatalogStore::new());
  let objects = Arc::new(MemoryObjectStore::new());
  let queue = Arc::new(MemoryQueue::new(config.queue.max_receives));
  let notifier = Arc::new(MemoryNotifier::new());
  let credentials = StaticCredentialStore::from_config(&config.cart_credentials).unwrap();

  let backends = Backends {
    carts: carts.clone(),
    catalog: catalog.clone(),
    objects: objects.clone(),
    queue: queue.clone(),
    notifier: notifier.clone(),
    credentials: Arc::new(credentials),
  };

  TestApp {
    state: AppState::new(config, backends),
    carts,
    catalog,
    objects,
    queue,
    notifier,
  }
}

pub fn snapshot(id: &str, title: &str, price: f64) -> ProductSnapshot {
  ProductSnapshot {
    id: id.to_string(),
    title: title.to_string(),
    description: String::new(),
    price,
  }
}

pub fn batch_message(id: &str, count: i32) -> String {
  serde_json::to_string(&ImportBatchMessage {
    id: id.to_string(),
    title: format!("Product {}", id),
    description: "imported".to_string(),
    price: 12.5,
    count,
  })
  .unwrap()
}

static TRACING: Lazy<()> = Lazy::new(|| {
  let _ = tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}
