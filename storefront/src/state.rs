// storefront/src/state.rs

use crate::config::{AppConfig, StoreBackend};
use crate::db;
use crate::errors::{AppError, Result};
use crate::pipelines::register_all_pipelines;
use crate::services::auth_service::{CredentialStore, StaticCredentialStore};
use crate::services::import_service::ImportLedger;
use crate::services::notifier::{LogNotifier, Notifier};
use crate::services::object_store::{FsObjectStore, ObjectStore};
use crate::services::queue::{MemoryQueue, MessageQueue};
use crate::stores::{CartStore, CatalogStore, MemoryCartStore, MemoryCatalogStore, PgCartStore, PgCatalogStore};
use flow::Flow;
use std::sync::Arc;

/// Shared by every handler, pipeline and worker.
#[derive(Clone)]
pub struct AppState {
  pub carts: Arc<dyn CartStore>,
  pub catalog: Arc<dyn CatalogStore>,
  pub objects: Arc<dyn ObjectStore>,
  pub queue: Arc<dyn MessageQueue>,
  pub notifier: Arc<dyn Notifier>,
  pub credentials: Arc<dyn CredentialStore>,
  pub import_ledger: Arc<ImportLedger>,
  pub flows: Arc<Flow<AppError>>,
  pub config: Arc<AppConfig>,
}

/// The external collaborators an `AppState` is built from.
#[derive(Clone)]
pub struct Backends {
  pub carts: Arc<dyn CartStore>,
  pub catalog: Arc<dyn CatalogStore>,
  pub objects: Arc<dyn ObjectStore>,
  pub queue: Arc<dyn MessageQueue>,
  pub notifier: Arc<dyn Notifier>,
  pub credentials: Arc<dyn CredentialStore>,
}

impl Backends {
  /// Everything in process except the object store, which lives under
  /// `OBJECT_STORE_ROOT`.
  pub fn in_memory(config: &AppConfig) -> Result<Self> {
    Ok(Self {
      carts: Arc::new(MemoryCartStore::new()),
      catalog: Arc::new(MemoryCatalogStore::new()),
      objects: Arc::new(FsObjectStore::new(&config.object_store_root)),
      queue: Arc::new(MemoryQueue::new(config.queue.max_receives)),
      notifier: Arc::new(LogNotifier),
      credentials: Arc::new(StaticCredentialStore::from_config(&config.cart_credentials)?),
    })
  }

  /// Backends for `config.store_backend`. For Postgres this opens the shared
  /// pool and applies migrations when configured to.
  pub async fn from_config(config: &AppConfig) -> Result<Self> {
    let mut backends = Self::in_memory(config)?;
    if config.store_backend == StoreBackend::Postgres {
      let pool = db::pool(config).await?;
      if config.run_migrations {
        db::run_migrations(&pool).await?;
      }
      backends.carts = Arc::new(PgCartStore::new(pool.clone()));
      backends.catalog = Arc::new(PgCatalogStore::new(pool));
    }
    Ok(backends)
  }
}

impl AppState {
  /// Wires `backends` together and registers all pipelines.
  pub fn new(config: AppConfig, backends: Backends) -> Self {
    let flows = Flow::<AppError>::new();
    register_all_pipelines(&flows);

    Self {
      carts: backends.carts,
      catalog: backends.catalog,
      objects: backends.objects,
      queue: backends.queue,
      notifier: backends.notifier,
      credentials: backends.credentials,
      import_ledger: Arc::new(ImportLedger::new()),
      flows: Arc::new(flows),
      config: Arc::new(config),
    }
  }
}
